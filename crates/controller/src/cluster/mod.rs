//! kube-rs implementations of the controller's external seams.

mod crd;
mod discovery;
mod events;
mod lease;
mod scale;
mod store;

use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::error::ClientError;

pub use self::crd::KubeCrdRegistry;
pub use self::discovery::KubeDiscovery;
pub use self::events::KubeEventSink;
pub use self::lease::KubeLeaseLock;
pub use self::scale::KubeScaleClient;
pub use self::store::KubeScheduleStore;

impl From<kube::Error> for ClientError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) if resp.code == 404 => ClientError::NotFound(resp.message),
            kube::Error::Api(resp) if resp.code == 409 => ClientError::Conflict(resp.message),
            kube::Error::Api(resp) => ClientError::Api {
                code: resp.code,
                message: resp.message,
            },
            kube::Error::SerdeError(e) => ClientError::Serialization(e.to_string()),
            other => ClientError::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

/// Client from an explicit kubeconfig file, or the in-cluster / default
/// kubeconfig when `kubeconfig` is `None`.
pub async fn build_client(kubeconfig: Option<&Path>) -> Result<Client, ClientError> {
    let Some(path) = kubeconfig else {
        return Ok(Client::try_default().await?);
    };

    let kubeconfig = Kubeconfig::read_from(path)
        .map_err(|e| ClientError::Transport(format!("reading {}: {}", path.display(), e)))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| ClientError::Transport(format!("loading {}: {}", path.display(), e)))?;
    Ok(Client::try_from(config)?)
}
