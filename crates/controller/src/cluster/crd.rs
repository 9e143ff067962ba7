use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};

use crate::crd::CrdRegistry;
use crate::error::ClientError;

/// `apiextensions.k8s.io/v1` CustomResourceDefinitions.
pub struct KubeCrdRegistry {
    api: Api<CustomResourceDefinition>,
}

impl KubeCrdRegistry {
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl CrdRegistry for KubeCrdRegistry {
    async fn get(&self, name: &str) -> Result<Option<CustomResourceDefinition>, ClientError> {
        Ok(self.api.get_opt(name).await?)
    }

    async fn create(&self, crd: &CustomResourceDefinition) -> Result<(), ClientError> {
        self.api.create(&PostParams::default(), crd).await?;
        Ok(())
    }

    async fn replace(&self, crd: &CustomResourceDefinition) -> Result<(), ClientError> {
        self.api
            .replace(&crd.name_any(), &PostParams::default(), crd)
            .await?;
        Ok(())
    }
}
