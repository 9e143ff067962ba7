//! Installing the `CronHPA` CustomResourceDefinition.
//!
//! The definition is read, compared with the one this binary was built
//! with, and created or replaced when it is missing or differs. The check
//! is retried on a fixed period until it succeeds.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionSpec,
};
use kube::{CustomResourceExt, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cronhpa_core::CronHpa;

use crate::error::ClientError;

/// Delay between attempts of [`ensure_crd_until_ready`].
pub const CRD_RETRY_PERIOD: Duration = Duration::from_secs(5);

/// Cluster-scoped store of CustomResourceDefinitions.
#[async_trait]
pub trait CrdRegistry: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<CustomResourceDefinition>, ClientError>;

    async fn create(&self, crd: &CustomResourceDefinition) -> Result<(), ClientError>;

    /// Replace, guarded by `crd.metadata.resource_version`.
    async fn replace(&self, crd: &CustomResourceDefinition) -> Result<(), ClientError>;
}

/// What [`ensure_crd`] has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrdAction {
    Create,
    /// Replace the installed definition read at `resource_version`.
    Replace { resource_version: Option<String> },
    UpToDate,
}

/// The `CronHPA` definition this binary serves.
pub fn desired_crd() -> CustomResourceDefinition {
    CronHpa::crd()
}

/// Fields compared against the installed definition. Server-defaulted
/// fields such as `conversion` are ignored.
fn same_definition(installed: &CustomResourceDefinitionSpec, desired: &CustomResourceDefinitionSpec) -> bool {
    installed.group == desired.group
        && installed.scope == desired.scope
        && installed.names == desired.names
        && installed.versions == desired.versions
}

pub fn plan(installed: Option<&CustomResourceDefinition>, desired: &CustomResourceDefinition) -> CrdAction {
    match installed {
        None => CrdAction::Create,
        Some(crd) if same_definition(&crd.spec, &desired.spec) => CrdAction::UpToDate,
        Some(crd) => CrdAction::Replace {
            resource_version: crd.metadata.resource_version.clone(),
        },
    }
}

/// Bring the installed definition in line with `desired`, once.
pub async fn ensure_crd(
    registry: &dyn CrdRegistry,
    desired: &CustomResourceDefinition,
) -> Result<CrdAction, ClientError> {
    let name = desired.name_any();
    let installed = registry.get(&name).await?;
    let action = plan(installed.as_ref(), desired);

    match &action {
        CrdAction::UpToDate => debug!(crd = %name, "CRD already up to date"),
        CrdAction::Create => {
            registry.create(desired).await?;
            info!(crd = %name, "Created CRD");
        }
        CrdAction::Replace { resource_version } => {
            let mut updated = desired.clone();
            updated.metadata.resource_version = resource_version.clone();
            registry.replace(&updated).await?;
            info!(crd = %name, "Updated CRD");
        }
    }
    Ok(action)
}

/// Retry [`ensure_crd`] every `period` until it succeeds.
///
/// Returns `false` when `cancel` fired first.
pub async fn ensure_crd_until_ready(
    registry: &dyn CrdRegistry,
    period: Duration,
    cancel: &CancellationToken,
) -> bool {
    let desired = desired_crd();
    loop {
        match ensure_crd(registry, &desired).await {
            Ok(_) => return true,
            Err(e) => warn!(error = %e, retry_in = ?period, "Failed to ensure CRD"),
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(period) => {}
        }
    }
}
