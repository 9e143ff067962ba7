use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn env_duration(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match env_opt(key) {
        Some(raw) => parse_duration(&raw).ok_or(ConfigError::InvalidDuration {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

/// Parse a human-readable duration such as `"15s"`, `"1m30s"` or `"250ms"`.
///
/// Supports components `Xd`, `Xh`, `Xm`, `Xs` and `Xms`. A bare number is
/// read as seconds. Returns `None` if the string is empty or unparseable.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let n: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let (unit, len) = if rest.starts_with("ms") {
            (Duration::from_millis(1), 2)
        } else {
            match rest.chars().next()? {
                'd' => (Duration::from_secs(86_400), 1),
                'h' => (Duration::from_secs(3_600), 1),
                'm' => (Duration::from_secs(60), 1),
                's' => (Duration::from_secs(1), 1),
                _ => return None,
            }
        };
        total += unit * u32::try_from(n).ok()?;
        rest = &rest[len..];
    }

    Some(total)
}

// ── Top-level config ──────────────────────────────────────────

/// Runtime configuration of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Kubeconfig file; `None` means in-cluster or the default lookup.
    pub kubeconfig: Option<PathBuf>,
    /// Period of the reconciliation tick.
    pub sync_period: Duration,
    /// Period of the resolver cache rebuild.
    pub discovery_refresh_period: Duration,
    /// Install or update the `CronHPA` CRD before reconciling.
    pub create_crd: bool,
    pub leader_election: LeaderElectionConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            sync_period: Duration::from_secs(10),
            discovery_refresh_period: Duration::from_secs(30),
            create_crd: true,
            leader_election: LeaderElectionConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            kubeconfig: env_opt("KUBECONFIG").map(PathBuf::from),
            sync_period: env_duration("CRONHPA_SYNC_PERIOD", defaults.sync_period)?,
            discovery_refresh_period: env_duration(
                "CRONHPA_DISCOVERY_REFRESH_PERIOD",
                defaults.discovery_refresh_period,
            )?,
            create_crd: env_bool("CRONHPA_CREATE_CRD", defaults.create_crd),
            leader_election: LeaderElectionConfig::from_env()?,
        })
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_period.is_zero() {
            return Err(ConfigError::ZeroPeriod("sync period"));
        }
        if self.discovery_refresh_period.is_zero() {
            return Err(ConfigError::ZeroPeriod("discovery refresh period"));
        }
        if self.leader_election.enabled {
            self.leader_election.validate()?;
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let le = &self.leader_election;
        tracing::info!("Config loaded:");
        tracing::info!(
            "  kubeconfig:  {}",
            self.kubeconfig
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())
        );
        tracing::info!(
            "  loops:       sync={:?}, discovery_refresh={:?}",
            self.sync_period,
            self.discovery_refresh_period
        );
        tracing::info!("  create_crd:  {}", self.create_crd);
        tracing::info!(
            "  leader:      enabled={}, lock={}/{}, identity={}",
            le.enabled,
            le.lock_namespace,
            le.lock_name,
            le.identity
        );
        tracing::info!(
            "  lease:       duration={:?}, renew_deadline={:?}, retry_period={:?}",
            le.lease_duration,
            le.renew_deadline,
            le.retry_period
        );
    }
}

// ── Leader election ───────────────────────────────────────────

pub const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(15);
pub const DEFAULT_RENEW_DEADLINE: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(2);
pub const DEFAULT_LOCK_NAMESPACE: &str = "kube-system";
pub const DEFAULT_LOCK_NAME: &str = "cron-hpa-controller";

/// Factor the renew deadline must exceed the retry period by.
const JITTER_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderElectionConfig {
    pub enabled: bool,
    /// How long a follower waits after the last observed change before
    /// taking over a lease it does not hold.
    pub lease_duration: Duration,
    /// How long the leader keeps retrying a failed renewal before giving up.
    pub renew_deadline: Duration,
    /// Interval between acquire and renew attempts.
    pub retry_period: Duration,
    pub lock_namespace: String,
    pub lock_name: String,
    /// Holder identity written into the lease.
    pub identity: String,
    /// Clear the lease on graceful shutdown instead of letting it expire.
    pub release_on_cancel: bool,
}

impl Default for LeaderElectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lease_duration: DEFAULT_LEASE_DURATION,
            renew_deadline: DEFAULT_RENEW_DEADLINE,
            retry_period: DEFAULT_RETRY_PERIOD,
            lock_namespace: DEFAULT_LOCK_NAMESPACE.to_string(),
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            identity: default_identity(),
            release_on_cancel: false,
        }
    }
}

impl LeaderElectionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            enabled: env_bool("CRONHPA_LEADER_ELECT", defaults.enabled),
            lease_duration: env_duration("CRONHPA_LEASE_DURATION", defaults.lease_duration)?,
            renew_deadline: env_duration("CRONHPA_RENEW_DEADLINE", defaults.renew_deadline)?,
            retry_period: env_duration("CRONHPA_RETRY_PERIOD", defaults.retry_period)?,
            lock_namespace: env_or("CRONHPA_LOCK_NAMESPACE", &defaults.lock_namespace),
            lock_name: env_or("CRONHPA_LOCK_NAME", &defaults.lock_name),
            identity: env_opt("CRONHPA_IDENTITY").unwrap_or(defaults.identity),
            release_on_cancel: env_bool("CRONHPA_RELEASE_ON_CANCEL", defaults.release_on_cancel),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_period.is_zero() {
            return Err(ConfigError::ZeroPeriod("retry period"));
        }
        if self.lease_duration <= self.renew_deadline {
            return Err(ConfigError::LeaseNotLongerThanRenew {
                lease_duration: self.lease_duration,
                renew_deadline: self.renew_deadline,
            });
        }
        if self.renew_deadline.as_secs_f64() <= JITTER_FACTOR * self.retry_period.as_secs_f64() {
            return Err(ConfigError::RenewTooShort {
                renew_deadline: self.renew_deadline,
                retry_period: self.retry_period,
            });
        }
        if self.identity.trim().is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        Ok(())
    }
}

/// Pod hostname when running in a cluster, otherwise a random identity.
fn default_identity() -> String {
    env_opt("HOSTNAME").unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
