//! CronHPA controller: time-based replica changes for scalable workloads.
//!
//! This crate provides:
//! - [`resolver`]: scale target resolution against a periodically rebuilt
//!   discovery snapshot, with multi-candidate fallback
//! - [`applier`]: idempotent replica updates with rescale events
//! - [`reconciler`]: the poll-driven loop tying evaluation, resolution and
//!   application together across every `CronHPA`
//! - [`leader`]: lease-based leader election gating the loop
//! - [`crd`]: installation of the `CronHPA` CustomResourceDefinition
//! - [`cluster`]: kube-rs implementations of every external seam
//!
//! ```text
//!   sync tick (10s)                        refresh tick (30s)
//!        │                                        │
//!        ▼                                        ▼
//!   ScheduleStore::list ──► evaluate ──► ScaleResolver ◄── MappingCache
//!                                           │
//!                                           ▼
//!                              ScaleApplier ──► EventSink
//!                                           │
//!                                           ▼
//!                       status.lastScheduleTime ──► ScheduleStore::update
//! ```

pub mod applier;
pub mod cluster;
pub mod crd;
pub mod error;
pub mod events;
pub mod leader;
pub mod reconciler;
pub mod resolver;
pub mod scale;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use applier::{ApplyOutcome, ScaleApplier};
pub use crd::{CrdAction, CrdRegistry};
pub use error::{ApplyError, ClientError, LeaderError, ResolveError};
pub use events::{EventReason, EventSink, EventType, ScaleEvent};
pub use leader::{LeaderElector, LeaseLock, LeaseRecord, MemoryLeaseLock};
pub use reconciler::{Reconciler, ScheduleStore, SyncOutcome, TickSummary};
pub use resolver::{GroupKind, MappingCache, ResourceDiscovery, ScaleMapping, ScaleResolver};
pub use scale::{ScaleClient, ScaleHandle, ScaleState};

/// Name the controller reports events and logs under.
pub const CONTROLLER_NAME: &str = "cronhpa-controller";
