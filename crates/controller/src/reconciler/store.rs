use async_trait::async_trait;

use cronhpa_core::CronHpa;

use crate::error::ClientError;

/// Read/write access to `CronHPA` objects.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Every `CronHPA` in every namespace.
    async fn list(&self) -> Result<Vec<CronHpa>, ClientError>;

    /// Persist `object`, status included.
    async fn update(&self, object: &CronHpa) -> Result<CronHpa, ClientError>;
}
