//! The `CronHPA` custom resource.
//!
//! A `CronHPA` pairs an ordered list of cron rules with replica counts and
//! points them at a scalable workload through `spec.scaleTargetRef`. The
//! controller only ever writes `status.lastScheduleTime`.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group the resource is served under.
pub const GROUP: &str = "extensions.tkestack.io";

/// Served version of the resource.
pub const VERSION: &str = "v1";

/// Desired state of a `CronHPA`.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "extensions.tkestack.io",
    version = "v1",
    kind = "CronHPA",
    root = "CronHpa",
    plural = "cronhpas",
    singular = "cronhpa",
    status = "CronHpaStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CronHpaSpec {
    /// The workload whose scale subresource is driven.
    pub scale_target_ref: ScaleTargetRef,
    /// Rules in declaration order; the first due rule wins.
    #[serde(default)]
    pub crons: Vec<Cron>,
}

/// Cross-version reference to a scalable resource in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTargetRef {
    /// `group/version`, or just `version` for the core group.
    #[serde(default)]
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl fmt::Display for ScaleTargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A single cron rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cron {
    /// Standard 5-field cron expression or a descriptor such as `@daily`.
    pub schedule: String,
    pub target_replicas: i32,
}

impl Cron {
    pub fn new(schedule: impl Into<String>, target_replicas: i32) -> Self {
        Self {
            schedule: schedule.into(),
            target_replicas,
        }
    }
}

/// Observed state of a `CronHPA`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CronHpaStatus {
    /// When a rule last scaled the target successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_schedule_time: Option<DateTime<Utc>>,
}

impl CronHpa {
    /// `namespace/name`, used to identify the object in logs.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace().unwrap_or_default(), self.name_any())
    }

    pub fn last_schedule_time(&self) -> Option<DateTime<Utc>> {
        self.status.as_ref().and_then(|s| s.last_schedule_time)
    }

    /// Instant the next occurrence of every rule is computed from.
    ///
    /// The last trigger if there was one, otherwise the creation timestamp.
    /// `None` for an object the API server has not stamped yet.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.last_schedule_time().or_else(|| {
            self.metadata
                .creation_timestamp
                .as_ref()
                .map(|t| t.0)
        })
    }

    /// Record a successful trigger at `at`.
    ///
    /// The stored timestamp never moves backwards and is kept at whole-second
    /// precision, matching what the API server round-trips.
    pub fn record_trigger(&mut self, at: DateTime<Utc>) {
        let at = at.trunc_subsecs(0);
        let status = self.status.get_or_insert_with(CronHpaStatus::default);
        status.last_schedule_time = match status.last_schedule_time {
            Some(prev) if prev > at => Some(prev),
            _ => Some(at),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    fn sample() -> CronHpa {
        let mut hpa = CronHpa::new(
            "web",
            CronHpaSpec {
                scale_target_ref: ScaleTargetRef {
                    api_version: "apps/v1".into(),
                    kind: "Deployment".into(),
                    name: "web".into(),
                },
                crons: vec![Cron::new("0 8 * * *", 6), Cron::new("0 20 * * *", 2)],
            },
        );
        hpa.metadata.namespace = Some("prod".into());
        hpa
    }

    #[test]
    fn full_name_is_namespace_slash_name() {
        assert_eq!(sample().full_name(), "prod/web");
    }

    #[test]
    fn reference_time_falls_back_to_creation() {
        let mut hpa = sample();
        assert_eq!(hpa.reference_time(), None);

        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        hpa.metadata.creation_timestamp = Some(Time(created));
        assert_eq!(hpa.reference_time(), Some(created));

        let triggered = Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 3).unwrap();
        hpa.record_trigger(triggered);
        assert_eq!(hpa.reference_time(), Some(triggered));
    }

    #[test]
    fn record_trigger_never_moves_backwards() {
        let mut hpa = sample();
        let later = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let earlier = later - chrono::Duration::hours(1);

        hpa.record_trigger(later);
        hpa.record_trigger(earlier);
        assert_eq!(hpa.last_schedule_time(), Some(later));
    }

    #[test]
    fn record_trigger_truncates_subseconds() {
        let mut hpa = sample();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        hpa.record_trigger(at);
        assert_eq!(
            hpa.last_schedule_time(),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn deserializes_api_server_payload() {
        let json = serde_json::json!({
            "apiVersion": "extensions.tkestack.io/v1",
            "kind": "CronHPA",
            "metadata": {
                "name": "example",
                "namespace": "default",
                "creationTimestamp": "2026-01-01T00:00:00Z"
            },
            "spec": {
                "scaleTargetRef": {"apiVersion": "apps/v1", "kind": "Deployment", "name": "demo"},
                "crons": [
                    {"schedule": "*/1 * * * *", "targetReplicas": 1},
                    {"schedule": "*/2 * * * *", "targetReplicas": 3}
                ]
            },
            "status": {"lastScheduleTime": "2026-01-01T00:10:00Z"}
        });

        let hpa: CronHpa = serde_json::from_value(json).unwrap();
        assert_eq!(hpa.full_name(), "default/example");
        assert_eq!(hpa.spec.crons.len(), 2);
        assert_eq!(hpa.spec.crons[1].target_replicas, 3);
        assert_eq!(hpa.spec.scale_target_ref.to_string(), "Deployment/demo");
        assert_eq!(
            hpa.last_schedule_time(),
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 10, 0).unwrap())
        );
    }

    #[test]
    fn status_serializes_without_empty_timestamp() {
        let status = CronHpaStatus::default();
        assert_eq!(serde_json::to_value(&status).unwrap(), serde_json::json!({}));
    }
}
