use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{ApiResource, DynamicObject, PostParams};
use kube::{Api, Client};

use crate::error::ClientError;
use crate::resolver::ScaleMapping;
use crate::scale::{ScaleClient, ScaleState};

/// Scale subresource access for any discovered resource.
pub struct KubeScaleClient {
    client: Client,
}

impl KubeScaleClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, mapping: &ScaleMapping, namespace: &str) -> Api<DynamicObject> {
        let resource = ApiResource {
            group: mapping.group.clone(),
            version: mapping.version.clone(),
            api_version: mapping.api_version(),
            kind: mapping.kind.clone(),
            plural: mapping.resource.clone(),
        };
        if mapping.namespaced {
            Api::namespaced_with(self.client.clone(), namespace, &resource)
        } else {
            Api::all_with(self.client.clone(), &resource)
        }
    }
}

fn to_state(scale: Scale) -> ScaleState {
    ScaleState {
        replicas: scale.spec.and_then(|s| s.replicas).unwrap_or(0),
        resource_version: scale.metadata.resource_version,
    }
}

#[async_trait]
impl ScaleClient for KubeScaleClient {
    async fn get_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
    ) -> Result<ScaleState, ClientError> {
        let scale = self.api(mapping, namespace).get_scale(name).await?;
        Ok(to_state(scale))
    }

    async fn update_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
        scale: &ScaleState,
    ) -> Result<ScaleState, ClientError> {
        let body = Scale {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: mapping.namespaced.then(|| namespace.to_string()),
                resource_version: scale.resource_version.clone(),
                ..ObjectMeta::default()
            },
            spec: Some(ScaleSpec {
                replicas: Some(scale.replicas),
            }),
            status: None,
        };
        let data = serde_json::to_vec(&body)?;
        let updated = self
            .api(mapping, namespace)
            .replace_scale(name, &PostParams::default(), data)
            .await?;
        Ok(to_state(updated))
    }
}
