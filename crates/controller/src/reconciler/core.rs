//! [`Reconciler`]: drives every `CronHPA` from due rule to recorded trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use cronhpa_core::{ControllerConfig, CronHpa};
use cronhpa_schedule::evaluate;

use crate::applier::{ApplyOutcome, ScaleApplier};
use crate::error::ClientError;
use crate::events::{EventReason, EventSink, ScaleEvent};
use crate::resolver::{MappingCache, ScaleResolver};
use crate::scale::ScaleClient;

use super::store::ScheduleStore;

/// What one object's reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No rule is due.
    NotDue,
    /// The object has neither a last trigger nor a creation time yet.
    Unscheduled,
    /// A rule fired and the trigger was recorded.
    Scaled(ApplyOutcome),
    ResolveFailed,
    ApplyFailed,
    /// Replicas were applied but the trigger time could not be stored.
    StatusPersistFailed(ApplyOutcome),
}

/// Counts of per-object outcomes for one sync tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub listed: usize,
    pub not_due: usize,
    pub unscheduled: usize,
    pub scaled: usize,
    pub failed: usize,
}

impl TickSummary {
    fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::NotDue => self.not_due += 1,
            SyncOutcome::Unscheduled => self.unscheduled += 1,
            SyncOutcome::Scaled(_) => self.scaled += 1,
            SyncOutcome::ResolveFailed
            | SyncOutcome::ApplyFailed
            | SyncOutcome::StatusPersistFailed(_) => self.failed += 1,
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn ScheduleStore>,
    cache: Arc<MappingCache>,
    resolver: ScaleResolver,
    applier: ScaleApplier,
    events: Arc<dyn EventSink>,
    sync_period: Duration,
    refresh_period: Duration,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        cache: Arc<MappingCache>,
        scale_client: Arc<dyn ScaleClient>,
        events: Arc<dyn EventSink>,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            store,
            resolver: ScaleResolver::new(cache.clone(), scale_client.clone()),
            applier: ScaleApplier::new(scale_client, events.clone()),
            cache,
            events,
            sync_period: config.sync_period,
            refresh_period: config.discovery_refresh_period,
        }
    }

    /// Reconcile every `CronHPA` once, sequentially.
    ///
    /// Only a failure to list ends the tick early; per-object failures are
    /// counted in the summary and the walk moves on.
    pub async fn sync_all(&self, now: DateTime<Utc>) -> Result<TickSummary, ClientError> {
        let objects = self.store.list().await?;
        let mut summary = TickSummary {
            listed: objects.len(),
            ..TickSummary::default()
        };

        for object in &objects {
            let outcome = self.sync_one(object, now).await;
            summary.record(&outcome);
        }
        Ok(summary)
    }

    /// Reconcile a single object at `now`.
    pub async fn sync_one(&self, object: &CronHpa, now: DateTime<Utc>) -> SyncOutcome {
        let name = object.full_name();
        let Some(reference_time) = object.reference_time() else {
            debug!(cronhpa = %name, "no reference time yet, skipping");
            return SyncOutcome::Unscheduled;
        };

        let due = {
            // Rule warnings from the evaluator carry the object name.
            let span = info_span!("evaluate", cronhpa = %name);
            let _enter = span.enter();
            evaluate(&object.spec.crons, reference_time, now).map(|d| d.target_replicas)
        };
        let Some(desired) = due else {
            return SyncOutcome::NotDue;
        };

        let namespace = object.namespace().unwrap_or_default();
        let target = &object.spec.scale_target_ref;
        let handle = match self.resolver.resolve(target, &namespace).await {
            Ok(h) => h,
            Err(e) => {
                warn!(cronhpa = %name, target = %target, error = %e, "Failed to resolve scale target");
                self.events
                    .publish(
                        object,
                        ScaleEvent::warning(EventReason::FailedGetScale, e.to_string()),
                    )
                    .await;
                return SyncOutcome::ResolveFailed;
            }
        };

        let applied = match self.applier.apply(object, &handle, desired).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(cronhpa = %name, error = %e, "Failed to apply scheduled replicas");
                return SyncOutcome::ApplyFailed;
            }
        };

        let mut updated = object.clone();
        updated.record_trigger(now);
        match self.store.update(&updated).await {
            Ok(_) => {
                debug!(cronhpa = %name, last_schedule_time = %now, "recorded trigger");
                SyncOutcome::Scaled(applied)
            }
            Err(e) => {
                error!(cronhpa = %name, error = %e, "Failed to persist lastScheduleTime");
                SyncOutcome::StatusPersistFailed(applied)
            }
        }
    }

    /// Run the sync and discovery-refresh ticks until `cancel` fires.
    ///
    /// Cancellation abandons a tick in progress; objects not yet reached
    /// keep their pre-tick state.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            sync_period = ?self.sync_period,
            refresh_period = ?self.refresh_period,
            "Starting cronhpa controller"
        );

        let refresh = tokio::spawn(refresh_loop(
            self.cache.clone(),
            self.refresh_period,
            cancel.clone(),
        ));

        let mut ticker = tokio::time::interval(self.sync_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("abandoning in-flight sync tick");
                    break;
                }
                result = self.sync_all(Utc::now()) => match result {
                    Ok(summary) if summary.scaled > 0 || summary.failed > 0 => {
                        info!(
                            listed = summary.listed,
                            scaled = summary.scaled,
                            failed = summary.failed,
                            "Sync tick complete"
                        );
                    }
                    Ok(summary) => {
                        debug!(listed = summary.listed, "sync tick complete, nothing due");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to list cronhpas");
                    }
                },
            }
        }

        if let Err(e) = refresh.await {
            warn!(error = %e, "Discovery refresh task panicked");
        }
        info!("Shutting down");
    }
}

/// Rebuild the discovery snapshot every `period` until `cancel` fires.
async fn refresh_loop(cache: Arc<MappingCache>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate first tick (startup already refreshed)
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = cache.refresh() => {
                        if let Err(e) = result {
                            warn!(
                                error = %e,
                                last_refresh = ?cache.snapshot().refreshed_at(),
                                "Discovery refresh failed, keeping previous snapshot"
                            );
                        }
                    }
                }
            }
        }
    }
}
