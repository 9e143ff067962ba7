use async_trait::async_trait;
use kube::runtime::events::{Event, EventType as KubeEventType, Recorder, Reporter};
use kube::{Client, Resource};
use tracing::{info, warn};

use cronhpa_core::CronHpa;

use crate::events::{EventSink, EventType, ScaleEvent};
use crate::CONTROLLER_NAME;

/// Publishes events to the cluster, attached to the `CronHPA` object.
pub struct KubeEventSink {
    recorder: Recorder,
}

impl KubeEventSink {
    pub fn new(client: Client, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn publish(&self, object: &CronHpa, event: ScaleEvent) {
        info!(
            cronhpa = %object.full_name(),
            event_type = ?event.type_,
            reason = %event.reason,
            message = %event.message,
            "Event"
        );

        let type_ = match event.type_ {
            EventType::Normal => KubeEventType::Normal,
            EventType::Warning => KubeEventType::Warning,
        };
        let record = Event {
            type_,
            reason: event.reason.as_str().to_string(),
            note: Some(event.message),
            action: "Scale".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&record, &object.object_ref(&())).await {
            warn!(
                cronhpa = %object.full_name(),
                reason = %record.reason,
                error = %e,
                "Failed to publish event"
            );
        }
    }
}
