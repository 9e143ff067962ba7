//! Shared types for the CronHPA controller: the custom resource definition,
//! environment-driven configuration, and configuration errors.

pub mod config;
pub mod crd;
pub mod error;

pub use config::{ControllerConfig, LeaderElectionConfig};
pub use crd::{Cron, CronHpa, CronHpaSpec, CronHpaStatus, ScaleTargetRef};
pub use error::*;
