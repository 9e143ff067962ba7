//! The scale subresource as seen by the controller.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::resolver::ScaleMapping;

/// Snapshot of a resource's scale subresource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleState {
    /// Desired replicas (`spec.replicas`).
    pub replicas: i32,
    /// Version the state was read at; sent back on update so a concurrent
    /// writer is detected as a conflict.
    pub resource_version: Option<String>,
}

/// A resolved, readable and writable view of one target's scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleHandle {
    pub mapping: ScaleMapping,
    pub namespace: String,
    pub name: String,
    pub scale: ScaleState,
}

impl ScaleHandle {
    pub fn current_replicas(&self) -> i32 {
        self.scale.replicas
    }

    /// `Kind/namespace/name`.
    pub fn reference(&self) -> String {
        format!("{}/{}/{}", self.mapping.kind, self.namespace, self.name)
    }
}

/// Generic access to the scale subresource of arbitrary resource kinds.
#[async_trait]
pub trait ScaleClient: Send + Sync {
    async fn get_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
    ) -> Result<ScaleState, ClientError>;

    /// Write `scale.replicas`, guarded by `scale.resource_version`.
    async fn update_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
        scale: &ScaleState,
    ) -> Result<ScaleState, ClientError>;
}
