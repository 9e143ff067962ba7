//! In-memory doubles of the controller's external seams, shared by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use cronhpa_core::{Cron, CronHpa, CronHpaSpec, ScaleTargetRef};

use crate::error::ClientError;
use crate::events::{EventReason, EventSink, ScaleEvent};
use crate::reconciler::ScheduleStore;
use crate::resolver::{ResourceDiscovery, ScaleMapping};
use crate::scale::{ScaleClient, ScaleState};

// ── Fixtures ─────────────────────────────────────────────────────────

pub(crate) fn mapping(group: &str, version: &str, kind: &str, resource: &str) -> ScaleMapping {
    ScaleMapping {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
        resource: resource.to_string(),
        namespaced: true,
    }
}

pub(crate) fn deployments() -> ScaleMapping {
    mapping("apps", "v1", "Deployment", "deployments")
}

pub(crate) fn scale(replicas: i32) -> ScaleState {
    ScaleState {
        replicas,
        resource_version: Some("1".to_string()),
    }
}

/// A `CronHPA` in `namespace` targeting the `apps/v1` Deployment `target`.
pub(crate) fn cronhpa(
    namespace: &str,
    name: &str,
    target: &str,
    crons: Vec<Cron>,
    created: DateTime<Utc>,
) -> CronHpa {
    let mut hpa = CronHpa::new(
        name,
        CronHpaSpec {
            scale_target_ref: ScaleTargetRef {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                name: target.to_string(),
            },
            crons,
        },
    );
    hpa.metadata.namespace = Some(namespace.to_string());
    hpa.metadata.creation_timestamp = Some(Time(created));
    hpa
}

// ── ScaleClient ──────────────────────────────────────────────────────

type ScaleKey = (String, String, String);

fn scale_key(mapping: &ScaleMapping, namespace: &str, name: &str) -> ScaleKey {
    (
        mapping.group_resource(),
        namespace.to_string(),
        name.to_string(),
    )
}

fn versioned(mapping: &ScaleMapping) -> String {
    format!("{}/{}", mapping.api_version(), mapping.resource)
}

/// Scale subresources keyed by `(group_resource, namespace, name)`; every
/// version of a resource sees the same object.
#[derive(Default)]
pub(crate) struct FakeScaleClient {
    scales: Mutex<HashMap<ScaleKey, ScaleState>>,
    get_errors: Mutex<HashMap<String, ClientError>>,
    update_error: Mutex<Option<ClientError>>,
    updates: Mutex<Vec<(ScaleKey, i32)>>,
    gets: AtomicUsize,
}

impl FakeScaleClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_scale(
        self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Self {
        self.scales
            .lock()
            .unwrap()
            .insert(scale_key(mapping, namespace, name), scale(replicas));
        self
    }

    /// Every read through `mapping`'s exact version fails with `err`.
    pub(crate) fn failing_get(self, mapping: &ScaleMapping, err: ClientError) -> Self {
        self.get_errors
            .lock()
            .unwrap()
            .insert(versioned(mapping), err);
        self
    }

    pub(crate) fn fail_updates(&self, err: ClientError) {
        *self.update_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn replicas(&self, mapping: &ScaleMapping, namespace: &str, name: &str) -> Option<i32> {
        self.scales
            .lock()
            .unwrap()
            .get(&scale_key(mapping, namespace, name))
            .map(|s| s.replicas)
    }

    /// Replica counts written, in order.
    pub(crate) fn updates(&self) -> Vec<i32> {
        self.updates.lock().unwrap().iter().map(|(_, r)| *r).collect()
    }

    pub(crate) fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScaleClient for FakeScaleClient {
    async fn get_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
    ) -> Result<ScaleState, ClientError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.get_errors.lock().unwrap().get(&versioned(mapping)) {
            return Err(err.clone());
        }
        self.scales
            .lock()
            .unwrap()
            .get(&scale_key(mapping, namespace, name))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", namespace, name)))
    }

    async fn update_scale(
        &self,
        mapping: &ScaleMapping,
        namespace: &str,
        name: &str,
        desired: &ScaleState,
    ) -> Result<ScaleState, ClientError> {
        if let Some(err) = self.update_error.lock().unwrap().clone() {
            return Err(err);
        }
        let key = scale_key(mapping, namespace, name);
        let mut scales = self.scales.lock().unwrap();
        let current = scales
            .get_mut(&key)
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", namespace, name)))?;
        if current.resource_version != desired.resource_version {
            return Err(ClientError::Conflict(format!(
                "the object {}/{} has been modified",
                namespace, name
            )));
        }

        let next_version = current
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        current.replicas = desired.replicas;
        current.resource_version = Some(next_version.to_string());
        self.updates.lock().unwrap().push((key, desired.replicas));
        Ok(current.clone())
    }
}

// ── ResourceDiscovery ────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeDiscovery {
    mappings: Mutex<Vec<ScaleMapping>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeDiscovery {
    pub(crate) fn new(mappings: Vec<ScaleMapping>) -> Self {
        Self {
            mappings: Mutex::new(mappings),
            ..Self::default()
        }
    }

    pub(crate) fn set_mappings(&self, mappings: Vec<ScaleMapping>) {
        *self.mappings.lock().unwrap() = mappings;
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceDiscovery for FakeDiscovery {
    async fn scale_mappings(&self) -> Result<Vec<ScaleMapping>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("discovery unavailable".to_string()));
        }
        Ok(self.mappings.lock().unwrap().clone())
    }
}

// ── ScheduleStore ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeStore {
    objects: Mutex<Vec<CronHpa>>,
    fail_list: AtomicBool,
    fail_update: AtomicBool,
    update_calls: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn new(objects: Vec<CronHpa>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Self::default()
        }
    }

    pub(crate) fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn get(&self, full_name: &str) -> Option<CronHpa> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.full_name() == full_name)
            .cloned()
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleStore for FakeStore {
    async fn list(&self) -> Result<Vec<CronHpa>, ClientError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        Ok(self.objects.lock().unwrap().clone())
    }

    async fn update(&self, object: &CronHpa) -> Result<CronHpa, ClientError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ClientError::Conflict(object.full_name()));
        }
        let mut objects = self.objects.lock().unwrap();
        let slot = objects
            .iter_mut()
            .find(|o| o.full_name() == object.full_name())
            .ok_or_else(|| ClientError::NotFound(object.full_name()))?;
        *slot = object.clone();
        Ok(object.clone())
    }
}

// ── EventSink ────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct RecordingEvents {
    events: Mutex<Vec<(String, ScaleEvent)>>,
}

impl RecordingEvents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn all(&self) -> Vec<(String, ScaleEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn reasons(&self) -> Vec<EventReason> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.reason)
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingEvents {
    async fn publish(&self, object: &CronHpa, event: ScaleEvent) {
        self.events
            .lock()
            .unwrap()
            .push((object.full_name(), event));
    }
}
