use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta};
use kube::api::PostParams;
use kube::{Api, Client};

use crate::error::ClientError;
use crate::leader::{LeaseLock, LeaseRecord, VersionedRecord};

/// A `coordination.k8s.io/v1` `Lease` used as the election lock.
pub struct KubeLeaseLock {
    api: Api<Lease>,
    namespace: String,
    name: String,
}

impl KubeLeaseLock {
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    fn lease(&self, record: &LeaseRecord, version: Option<&str>) -> Lease {
        Lease {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                resource_version: version.map(String::from),
                ..ObjectMeta::default()
            },
            spec: Some(to_spec(record)),
        }
    }
}

/// Whole seconds, rounded up, at least one.
fn duration_seconds(d: Duration) -> i32 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    i32::try_from(secs.max(1)).unwrap_or(i32::MAX)
}

fn to_spec(record: &LeaseRecord) -> LeaseSpec {
    LeaseSpec {
        holder_identity: Some(record.holder_identity.clone()),
        lease_duration_seconds: Some(duration_seconds(record.lease_duration)),
        acquire_time: Some(MicroTime(record.acquire_time)),
        renew_time: Some(MicroTime(record.renew_time)),
        lease_transitions: Some(record.leader_transitions),
        ..LeaseSpec::default()
    }
}

fn to_record(spec: LeaseSpec) -> LeaseRecord {
    LeaseRecord {
        holder_identity: spec.holder_identity.unwrap_or_default(),
        lease_duration: Duration::from_secs(
            u64::try_from(spec.lease_duration_seconds.unwrap_or(0)).unwrap_or(0),
        ),
        acquire_time: spec.acquire_time.map(|t| t.0).unwrap_or_default(),
        renew_time: spec.renew_time.map(|t| t.0).unwrap_or_default(),
        leader_transitions: spec.lease_transitions.unwrap_or(0),
    }
}

#[async_trait]
impl LeaseLock for KubeLeaseLock {
    async fn get(&self) -> Result<Option<VersionedRecord>, ClientError> {
        let Some(lease) = self.api.get_opt(&self.name).await? else {
            return Ok(None);
        };
        Ok(Some(VersionedRecord {
            version: lease.metadata.resource_version.unwrap_or_default(),
            record: to_record(lease.spec.unwrap_or_default()),
        }))
    }

    async fn create(&self, record: &LeaseRecord) -> Result<(), ClientError> {
        self.api
            .create(&PostParams::default(), &self.lease(record, None))
            .await?;
        Ok(())
    }

    async fn update(&self, record: &LeaseRecord, version: &str) -> Result<(), ClientError> {
        self.api
            .replace(&self.name, &PostParams::default(), &self.lease(record, Some(version)))
            .await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
