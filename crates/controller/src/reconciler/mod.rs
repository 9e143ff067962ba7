//! The poll-driven reconciliation loop.
//!
//! Every sync tick lists all `CronHPA` objects and walks them one at a time:
//! evaluate the rules, resolve the scale target, apply the replica count and
//! record the trigger. A separate tick rebuilds the discovery snapshot the
//! resolver reads from.

mod core;
mod store;


pub use self::core::{Reconciler, SyncOutcome, TickSummary};
pub use self::store::ScheduleStore;
