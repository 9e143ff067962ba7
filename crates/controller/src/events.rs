//! Notifications attached to `CronHPA` objects.

use std::fmt;

use async_trait::async_trait;

use cronhpa_core::CronHpa;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventReason {
    /// The scale target could not be resolved or read.
    FailedGetScale,
    /// The replica update was rejected.
    FailedRescale,
    SuccessfulRescale,
}

impl EventReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailedGetScale => "FailedGetScale",
            Self::FailedRescale => "FailedRescale",
            Self::SuccessfulRescale => "SuccessfulRescale",
        }
    }
}

impl fmt::Display for EventReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleEvent {
    pub type_: EventType,
    pub reason: EventReason,
    pub message: String,
}

impl ScaleEvent {
    pub fn normal(reason: EventReason, message: impl Into<String>) -> Self {
        Self {
            type_: EventType::Normal,
            reason,
            message: message.into(),
        }
    }

    pub fn warning(reason: EventReason, message: impl Into<String>) -> Self {
        Self {
            type_: EventType::Warning,
            reason,
            message: message.into(),
        }
    }
}

/// Destination for events about a `CronHPA`.
///
/// Publishing is fire-and-forget: implementations log delivery failures
/// instead of returning them, so an unreachable event sink never blocks a
/// scaling decision.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, object: &CronHpa, event: ScaleEvent);
}
