use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ClientError;

/// Contents of a leadership lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRecord {
    /// Empty when the lease has been released.
    pub holder_identity: String,
    pub lease_duration: Duration,
    pub acquire_time: DateTime<Utc>,
    pub renew_time: DateTime<Utc>,
    pub leader_transitions: i32,
}

/// A [`LeaseRecord`] plus the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    pub record: LeaseRecord,
    pub version: String,
}

/// Shared storage for a single lease with optimistic concurrency.
#[async_trait]
pub trait LeaseLock: Send + Sync {
    /// The current record, or `None` if the lease was never created.
    async fn get(&self) -> Result<Option<VersionedRecord>, ClientError>;

    /// Create the lease; `Conflict` if it already exists.
    async fn create(&self, record: &LeaseRecord) -> Result<(), ClientError>;

    /// Overwrite the lease; `Conflict` if it changed since `version`.
    async fn update(&self, record: &LeaseRecord, version: &str) -> Result<(), ClientError>;

    /// Human-readable lock name for logs.
    fn describe(&self) -> String;
}
