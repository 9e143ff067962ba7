//! Cron parsing and next-occurrence helpers.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use cron::Schedule;

/// A schedule expression that could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("unparseable schedule {schedule:?}: {source}")]
    Cron {
        schedule: String,
        #[source]
        source: cron::error::Error,
    },
    #[error("unparseable schedule {schedule:?}: invalid interval {interval:?}")]
    Interval { schedule: String, interval: String },
}

impl ScheduleError {
    /// The expression as the user wrote it.
    pub fn schedule(&self) -> &str {
        match self {
            ScheduleError::Cron { schedule, .. } | ScheduleError::Interval { schedule, .. } => {
                schedule
            }
        }
    }
}

/// A parsed rule schedule.
#[derive(Debug, Clone)]
pub enum CronSchedule {
    /// A calendar expression.
    Calendar(Schedule),
    /// Day-of-month and day-of-week are both restricted; a day matching
    /// either field fires.
    EitherDay {
        day_of_month: Schedule,
        day_of_week: Schedule,
    },
    /// `@every <interval>`: a fixed delay in whole seconds, at least one.
    Every(Duration),
}

const EVERY_PREFIX: &str = "@every ";

/// Parse a user-supplied cron expression.
///
/// Accepts standard 5-field expressions, the 6/7-field seconds-first form,
/// descriptors such as `@hourly`, and `@every <interval>` with Go-style
/// intervals (`90s`, `1h30m`, `1.5h`).
pub fn parse_schedule(expr: &str) -> Result<CronSchedule, ScheduleError> {
    let trimmed = expr.trim();
    if let Some(interval) = trimmed.strip_prefix(EVERY_PREFIX) {
        let delay = parse_interval(interval).ok_or_else(|| ScheduleError::Interval {
            schedule: expr.to_string(),
            interval: interval.trim().to_string(),
        })?;
        return Ok(CronSchedule::Every(whole_seconds(delay)));
    }

    let parse = |normalized: &str| {
        Schedule::from_str(normalized).map_err(|source| ScheduleError::Cron {
            schedule: expr.to_string(),
            source,
        })
    };

    let normalized = normalize_cron(trimmed);
    match split_day_fields(&normalized) {
        Some((day_of_month, day_of_week)) => Ok(CronSchedule::EitherDay {
            day_of_month: parse(&day_of_month)?,
            day_of_week: parse(&day_of_week)?,
        }),
        None => parse(&normalized).map(CronSchedule::Calendar),
    }
}

/// First occurrence of `schedule` strictly after `after`.
pub fn next_occurrence(schedule: &CronSchedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        CronSchedule::Calendar(s) => s.after(&after).next(),
        CronSchedule::EitherDay {
            day_of_month,
            day_of_week,
        } => {
            let by_month = day_of_month.after(&after).next();
            let by_week = day_of_week.after(&after).next();
            match (by_month, by_week) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            }
        }
        CronSchedule::Every(delay) => {
            let delay = chrono::Duration::from_std(*delay).ok()?;
            after.trunc_subsecs(0).checked_add_signed(delay)
        }
    }
}

/// Normalize a 5-field cron expression to the 6-field form the `cron` crate
/// parses, by prepending a zero seconds field.
///
/// Standard cron numbers weekdays `0-6` from Sunday while the `cron` crate
/// uses `1-7`, so numeric weekday values are shifted by one. Step values
/// after `/` are left alone. Anything that is not 5 fields passes through.
pub(crate) fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.as_slice() {
        [min, hour, dom, month, dow] => {
            format!("0 {min} {hour} {dom} {month} {}", shift_day_of_week(dow))
        }
        ["@annually"] => "@yearly".to_string(),
        ["@midnight"] => "@daily".to_string(),
        _ => trimmed.to_string(),
    }
}

/// For a seconds-first expression restricting both day fields, the two
/// single-day-field expressions whose union is the standard cron meaning.
fn split_day_fields(normalized: &str) -> Option<(String, String)> {
    let fields: Vec<&str> = normalized.split_whitespace().collect();
    if !(6..=7).contains(&fields.len()) || is_unrestricted(fields[3]) || is_unrestricted(fields[5]) {
        return None;
    }

    let with = |index: usize| {
        let mut f = fields.clone();
        f[index] = "*";
        f.join(" ")
    };
    Some((with(5), with(3)))
}

/// `*` or `?`, optionally with a step of 1, in any list element.
fn is_unrestricted(field: &str) -> bool {
    field.split(',').any(|part| {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };
        matches!(range, "*" | "?") && matches!(step, None | Some("1"))
    })
}

fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|part| match part.split_once('/') {
            Some((range, step)) => format!("{}/{}", shift_numbers(range), step),
            None => shift_numbers(part),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn shift_numbers(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            flush_shifted(&mut out, &mut digits);
            out.push(ch);
        }
    }
    flush_shifted(&mut out, &mut digits);
    out
}

fn flush_shifted(out: &mut String, digits: &mut String) {
    if digits.is_empty() {
        return;
    }
    match digits.parse::<u32>() {
        Ok(n) => out.push_str(&(n + 1).to_string()),
        Err(_) => out.push_str(digits),
    }
    digits.clear();
}

// ── @every ───────────────────────────────────────────────────────

/// Truncate to whole seconds, with a one second floor.
fn whole_seconds(d: Duration) -> Duration {
    Duration::from_secs(d.as_secs().max(1))
}

/// Parse an interval such as `90s`, `1h30m`, `1.5h` or `250ms`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; every component
/// needs one. A lone `0` is accepted.
pub(crate) fn parse_interval(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let value: f64 = rest[..len].parse().ok()?;
        rest = &rest[len..];

        let (unit, len) = [
            ("ns", 1e0),
            ("us", 1e3),
            ("µs", 1e3),
            ("ms", 1e6),
            ("s", 1e9),
            ("m", 60e9),
            ("h", 3_600e9),
        ]
        .iter()
        .find(|(suffix, _)| rest.starts_with(suffix))
        .map(|(suffix, unit)| (*unit, suffix.len()))?;
        nanos += value * unit;
        rest = &rest[len..];
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos as u64))
}
