//! Snapshot cache of scale-capable resource mappings.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ClientError;

use super::mapping::{GroupKind, ScaleMapping};

/// Source of scale-capable resource mappings.
#[async_trait]
pub trait ResourceDiscovery: Send + Sync {
    /// Every resource exposing a `scale` subresource, grouped by API group
    /// with the group's preferred version first.
    async fn scale_mappings(&self) -> Result<Vec<ScaleMapping>, ClientError>;
}

/// An immutable, complete view of discovery at one point in time.
#[derive(Debug, Default)]
pub struct MappingSnapshot {
    mappings: HashMap<GroupKind, Vec<ScaleMapping>>,
    refreshed_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl MappingSnapshot {
    fn build(discovered: Vec<ScaleMapping>, generation: u64) -> Self {
        let mut mappings: HashMap<GroupKind, Vec<ScaleMapping>> = HashMap::new();
        for mapping in discovered {
            let candidates = mappings.entry(mapping.group_kind()).or_default();
            if !candidates.contains(&mapping) {
                candidates.push(mapping);
            }
        }
        Self {
            mappings,
            refreshed_at: Some(Utc::now()),
            generation,
        }
    }

    /// Candidates for `key`, in discovery order.
    pub fn get(&self, key: &GroupKind) -> &[ScaleMapping] {
        self.mappings.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of distinct group/kinds known.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Incremented on every successful refresh; `0` before the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Holds the current [`MappingSnapshot`].
///
/// [`refresh`](MappingCache::refresh) builds a complete new snapshot before
/// publishing it with a single pointer swap, so readers see either the old
/// or the new snapshot and never a partial one.
pub struct MappingCache {
    discovery: Arc<dyn ResourceDiscovery>,
    current: RwLock<Arc<MappingSnapshot>>,
}

impl MappingCache {
    /// Create a cache with an empty snapshot. Call `refresh` before use.
    pub fn new(discovery: Arc<dyn ResourceDiscovery>) -> Self {
        Self {
            discovery,
            current: RwLock::new(Arc::new(MappingSnapshot::default())),
        }
    }

    /// Re-run discovery and publish the result.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<MappingSnapshot>, ClientError> {
        let discovered = self.discovery.scale_mappings().await?;
        let generation = self.snapshot().generation() + 1;
        let snapshot = Arc::new(MappingSnapshot::build(discovered, generation));

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        debug!(
            generation,
            group_kinds = snapshot.len(),
            "published discovery snapshot"
        );
        Ok(snapshot)
    }

    /// The snapshot currently published.
    pub fn snapshot(&self) -> Arc<MappingSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Candidates for `key` from the current snapshot.
    pub fn lookup(&self, key: &GroupKind) -> Vec<ScaleMapping> {
        self.snapshot().get(key).to_vec()
    }
}
