//! Positional "first due rule wins" evaluation.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use cronhpa_core::Cron;

use super::cron::{next_occurrence, parse_schedule};

/// The rule selected by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCron<'a> {
    /// Position of the rule in the declared list.
    pub index: usize,
    pub schedule: &'a str,
    pub target_replicas: i32,
    /// The occurrence after the reference time that made the rule due.
    pub occurrence: DateTime<Utc>,
}

/// Pick the rule that is due at `now`.
///
/// Rules are checked in declaration order. A rule is due when its first
/// occurrence strictly after `reference_time` is at or before `now`; the
/// first due rule is returned and later rules are not looked at. Rules that
/// fail to parse or ask for a negative replica count are logged and skipped.
pub fn evaluate(
    rules: &[Cron],
    reference_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DueCron<'_>> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.target_replicas < 0 {
            warn!(
                schedule = %rule.schedule,
                target_replicas = rule.target_replicas,
                "negative target replicas, skipping rule"
            );
            continue;
        }

        let schedule = match parse_schedule(&rule.schedule) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "skipping rule");
                continue;
            }
        };

        let Some(next) = next_occurrence(&schedule, reference_time) else {
            debug!(schedule = %rule.schedule, "schedule has no further occurrences");
            continue;
        };
        debug!(schedule = %rule.schedule, next = %next, "next occurrence");

        if next <= now {
            return Some(DueCron {
                index,
                schedule: &rule.schedule,
                target_replicas: rule.target_replicas,
                occurrence: next,
            });
        }
    }

    None
}
