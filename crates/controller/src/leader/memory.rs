use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::ClientError;

use super::lock::{LeaseLock, LeaseRecord, VersionedRecord};

/// Process-local [`LeaseLock`].
///
/// Candidates sharing one instance (behind an `Arc`) elect among themselves.
pub struct MemoryLeaseLock {
    name: String,
    state: Mutex<Option<(LeaseRecord, u64)>>,
}

impl MemoryLeaseLock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LeaseLock for MemoryLeaseLock {
    async fn get(&self) -> Result<Option<VersionedRecord>, ClientError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.as_ref().map(|(record, version)| VersionedRecord {
            record: record.clone(),
            version: version.to_string(),
        }))
    }

    async fn create(&self, record: &LeaseRecord) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_some() {
            return Err(ClientError::Conflict(format!("lease {} already exists", self.name)));
        }
        *state = Some((record.clone(), 1));
        Ok(())
    }

    async fn update(&self, record: &LeaseRecord, version: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.as_mut() {
            None => Err(ClientError::NotFound(format!("lease {}", self.name))),
            Some((current, current_version)) => {
                if current_version.to_string() != version {
                    return Err(ClientError::Conflict(format!(
                        "lease {} modified (version {} != {})",
                        self.name, current_version, version
                    )));
                }
                *current = record.clone();
                *current_version += 1;
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        format!("memory/{}", self.name)
    }
}
