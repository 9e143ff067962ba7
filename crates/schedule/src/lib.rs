//! Cron evaluation for `CronHPA` rules.
//!
//! Decides, from an ordered rule list and a reference instant, which rule
//! (if any) is due at `now`. Pure: no clocks, no I/O beyond diagnostics.

pub(crate) mod cron;
mod evaluator;

#[cfg(test)]
mod tests;

pub use self::cron::{next_occurrence, parse_schedule, CronSchedule, ScheduleError};
pub use self::evaluator::{evaluate, DueCron};
