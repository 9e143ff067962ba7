use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIGroup, APIResource};
use kube::Client;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::resolver::{ResourceDiscovery, ScaleMapping};

/// Subresource name that marks a resource as scalable.
const SCALE_SUBRESOURCE: &str = "scale";

/// Server-side API discovery.
///
/// Each group version is listed on its own; one that fails (an aggregated
/// API whose backend is down, say) is logged and left out of the result.
pub struct KubeDiscovery {
    client: Client,
}

impl KubeDiscovery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn list_resources(&self, group: &str, version: &str) -> kube::Result<Vec<APIResource>> {
        let list = if group.is_empty() {
            self.client.list_core_api_resources(version).await?
        } else {
            self.client
                .list_api_group_resources(&format!("{group}/{version}"))
                .await?
        };
        Ok(list.resources)
    }
}

/// The group's preferred version, then the rest in server order.
fn versions_in_order(group: &APIGroup) -> Vec<String> {
    let preferred = group.preferred_version.as_ref().map(|p| p.version.clone());
    let mut ordered: Vec<String> = preferred.iter().cloned().collect();
    ordered.extend(
        group
            .versions
            .iter()
            .map(|v| v.version.clone())
            .filter(|v| Some(v) != preferred.as_ref()),
    );
    ordered
}

/// Resources in one group version listing that expose `<resource>/scale`.
fn scale_mappings_in(group: &str, version: &str, resources: &[APIResource]) -> Vec<ScaleMapping> {
    resources
        .iter()
        .filter_map(|r| {
            let (parent, sub) = r.name.split_once('/')?;
            if sub != SCALE_SUBRESOURCE {
                return None;
            }
            let owner = resources.iter().find(|o| o.name == parent)?;
            Some(ScaleMapping {
                group: group.to_string(),
                version: version.to_string(),
                kind: owner.kind.clone(),
                resource: owner.name.clone(),
                namespaced: owner.namespaced,
            })
        })
        .collect()
}

#[async_trait]
impl ResourceDiscovery for KubeDiscovery {
    async fn scale_mappings(&self) -> Result<Vec<ScaleMapping>, ClientError> {
        let core = self.client.list_core_api_versions().await?;
        let groups = self.client.list_api_groups().await?;

        let targets = core
            .versions
            .into_iter()
            .map(|v| (String::new(), v))
            .chain(groups.groups.iter().flat_map(|g| {
                versions_in_order(g)
                    .into_iter()
                    .map(move |v| (g.name.clone(), v))
            }));

        let mut mappings = Vec::new();
        let mut listed = 0usize;
        let mut first_error = None;
        for (group, version) in targets {
            match self.list_resources(&group, &version).await {
                Ok(resources) => {
                    listed += 1;
                    mappings.extend(scale_mappings_in(&group, &version, &resources));
                }
                Err(e) => {
                    warn!(
                        group = %group,
                        version = %version,
                        error = %e,
                        "Skipping API group version that failed discovery"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if listed == 0 => Err(e.into()),
            _ => {
                debug!(listed, scalable = mappings.len(), "discovery complete");
                Ok(mappings)
            }
        }
    }
}
