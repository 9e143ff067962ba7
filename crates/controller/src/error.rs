//! Error types for the controller's external calls and decision steps.

use std::time::Duration;

use thiserror::Error;

use cronhpa_core::ConfigError;

use crate::resolver::GroupKind;

/// Failure of a call against the control plane (or a test double of it).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency failure: the object changed since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Scale target could not be turned into a usable scale handle.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid API version in scale target reference {api_version:?}: {reason}")]
    InvalidApiVersion {
        api_version: String,
        reason: &'static str,
    },

    /// Discovery knows no scale-capable resource for the group/kind.
    #[error("unable to determine resource for scale target reference: unrecognized resource {group_kind}")]
    UnrecognizedResource { group_kind: GroupKind },

    /// Every candidate failed; carries the error of the first one.
    #[error("failed to query scale subresource for {reference}: {source}")]
    FetchFailed {
        reference: String,
        #[source]
        source: ClientError,
    },
}

/// The replica update was attempted and rejected or lost.
#[derive(Debug, Error)]
#[error("failed to rescale {reference}: {source}")]
pub struct ApplyError {
    pub reference: String,
    #[source]
    pub source: ClientError,
}

#[derive(Debug, Error)]
pub enum LeaderError {
    #[error("leadership lost: lease {lock} not renewed within {renew_deadline:?}")]
    LeadershipLost {
        lock: String,
        renew_deadline: Duration,
    },

    #[error("invalid leader election config: {0}")]
    Config(#[from] ConfigError),
}
