use async_trait::async_trait;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client, ResourceExt};

use cronhpa_core::CronHpa;

use crate::error::ClientError;
use crate::reconciler::ScheduleStore;

/// `CronHPA` objects across all namespaces.
pub struct KubeScheduleStore {
    client: Client,
}

impl KubeScheduleStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScheduleStore for KubeScheduleStore {
    async fn list(&self) -> Result<Vec<CronHpa>, ClientError> {
        let api: Api<CronHpa> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn update(&self, object: &CronHpa) -> Result<CronHpa, ClientError> {
        let namespace = object.namespace().unwrap_or_default();
        let name = object.name_any();
        let api: Api<CronHpa> = Api::namespaced(self.client.clone(), &namespace);
        let pp = PostParams::default();

        let stored = api.replace(&name, &pp, object).await?;
        if stored.status == object.status {
            return Ok(stored);
        }

        // The status subresource is enabled, so the main resource ignored it.
        let mut with_status = stored;
        with_status.status = object.status.clone();
        let data = serde_json::to_vec(&with_status)?;
        Ok(api.replace_status(&name, &pp, data).await?)
    }
}
