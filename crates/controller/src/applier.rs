//! Idempotent replica updates through the scale subresource.

use std::sync::Arc;

use cronhpa_core::CronHpa;

use crate::error::ApplyError;
use crate::events::{EventReason, EventSink, ScaleEvent};
use crate::scale::{ScaleClient, ScaleHandle};

/// Result of [`ScaleApplier::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// `false` when the target already had the desired count.
    pub applied: bool,
    pub previous: i32,
    pub desired: i32,
}

/// Writes desired replica counts and reports each change on the owning
/// `CronHPA`.
pub struct ScaleApplier {
    client: Arc<dyn ScaleClient>,
    events: Arc<dyn EventSink>,
}

impl ScaleApplier {
    pub fn new(client: Arc<dyn ScaleClient>, events: Arc<dyn EventSink>) -> Self {
        Self { client, events }
    }

    /// Set `handle`'s target to `desired` replicas.
    ///
    /// A target already at `desired` is left alone. The update is guarded by
    /// the resource version `handle` was read at, so a concurrent change
    /// surfaces as an error rather than being overwritten.
    pub async fn apply(
        &self,
        owner: &CronHpa,
        handle: &ScaleHandle,
        desired: i32,
    ) -> Result<ApplyOutcome, ApplyError> {
        let previous = handle.current_replicas();
        if previous == desired {
            tracing::debug!(
                cronhpa = %owner.full_name(),
                target = %handle.reference(),
                replicas = desired,
                "Target already at desired replicas"
            );
            return Ok(ApplyOutcome {
                applied: false,
                previous,
                desired,
            });
        }

        let mut scale = handle.scale.clone();
        scale.replicas = desired;

        match self
            .client
            .update_scale(&handle.mapping, &handle.namespace, &handle.name, &scale)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    cronhpa = %owner.full_name(),
                    target = %handle.reference(),
                    previous,
                    desired,
                    "Rescaled target"
                );
                self.events
                    .publish(
                        owner,
                        ScaleEvent::normal(
                            EventReason::SuccessfulRescale,
                            format!("New size: {desired}, old size: {previous}"),
                        ),
                    )
                    .await;
                Ok(ApplyOutcome {
                    applied: true,
                    previous,
                    desired,
                })
            }
            Err(source) => {
                let err = ApplyError {
                    reference: handle.reference(),
                    source,
                };
                self.events
                    .publish(
                        owner,
                        ScaleEvent::warning(EventReason::FailedRescale, err.to_string()),
                    )
                    .await;
                Err(err)
            }
        }
    }
}
