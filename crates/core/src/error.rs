use std::time::Duration;

use thiserror::Error;

/// Configuration errors detected before the controller starts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: String, value: String },

    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),

    #[error("lease duration ({lease_duration:?}) must be greater than renew deadline ({renew_deadline:?})")]
    LeaseNotLongerThanRenew {
        lease_duration: Duration,
        renew_deadline: Duration,
    },

    #[error("renew deadline ({renew_deadline:?}) must be greater than 1.2 x retry period ({retry_period:?})")]
    RenewTooShort {
        renew_deadline: Duration,
        retry_period: Duration,
    },

    #[error("leader election identity must not be empty")]
    EmptyIdentity,
}
