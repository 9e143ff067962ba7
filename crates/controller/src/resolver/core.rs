//! [`ScaleResolver`]: scale target reference to scale handle.

use std::sync::Arc;

use tracing::debug;

use cronhpa_core::ScaleTargetRef;

use crate::error::ResolveError;
use crate::scale::{ScaleClient, ScaleHandle};

use super::cache::MappingCache;
use super::mapping::{parse_group_version, GroupKind};

pub struct ScaleResolver {
    cache: Arc<MappingCache>,
    client: Arc<dyn ScaleClient>,
}

impl ScaleResolver {
    pub fn new(cache: Arc<MappingCache>, client: Arc<dyn ScaleClient>) -> Self {
        Self { cache, client }
    }

    /// Resolve `target` in `namespace` to a handle carrying its current scale.
    ///
    /// Every candidate mapping for the target's group/kind is tried in
    /// snapshot order and the first one whose scale can be read wins. When
    /// all of them fail, the first error is returned, since later mappings
    /// are usually older versions of the same resource.
    pub async fn resolve(
        &self,
        target: &ScaleTargetRef,
        namespace: &str,
    ) -> Result<ScaleHandle, ResolveError> {
        let (group, _version) = parse_group_version(&target.api_version).map_err(|reason| {
            ResolveError::InvalidApiVersion {
                api_version: target.api_version.clone(),
                reason,
            }
        })?;
        let group_kind = GroupKind::new(group, &target.kind);
        let candidates = self.cache.lookup(&group_kind);

        let mut first_err = None;
        for mapping in candidates {
            match self.client.get_scale(&mapping, namespace, &target.name).await {
                Ok(scale) => {
                    debug!(
                        target = %target,
                        resource = %mapping.group_resource(),
                        replicas = scale.replicas,
                        "resolved scale target"
                    );
                    return Ok(ScaleHandle {
                        mapping,
                        namespace: namespace.to_string(),
                        name: target.name.clone(),
                        scale,
                    });
                }
                Err(e) => {
                    debug!(
                        target = %target,
                        resource = %mapping.group_resource(),
                        error = %e,
                        "scale candidate failed, trying next"
                    );
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(source) => Err(ResolveError::FetchFailed {
                reference: format!("{}/{}/{}", target.kind, namespace, target.name),
                source,
            }),
            None => Err(ResolveError::UnrecognizedResource { group_kind }),
        }
    }
}
