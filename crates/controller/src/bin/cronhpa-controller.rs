//! cronhpa-controller: scales workloads on cron schedules declared in
//! `CronHPA` objects.
//!
//! Every sync period all `CronHPA` objects are evaluated and any due rule's
//! replica count is written to the target's scale subresource. With leader
//! election enabled only the lease holder reconciles; losing the lease exits
//! the process with a non-zero status. Unless disabled, the reconciling
//! instance first installs or updates the `CronHPA` CRD.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cronhpa_controller::cluster::{
    build_client, KubeCrdRegistry, KubeDiscovery, KubeEventSink, KubeLeaseLock, KubeScaleClient,
    KubeScheduleStore,
};
use cronhpa_controller::crd::{ensure_crd_until_ready, CRD_RETRY_PERIOD};
use cronhpa_controller::shutdown::shutdown_token;
use cronhpa_controller::{LeaderElector, MappingCache, Reconciler};
use cronhpa_core::config::{load_dotenv, parse_duration};
use cronhpa_core::ControllerConfig;

// ── CLI ─────────────────────────────────────────────────────────────

/// CronHPA controller: cron-driven replica changes for scalable resources.
#[derive(Parser, Debug)]
#[command(name = "cronhpa-controller", version, about)]
struct Cli {
    /// Path to a kubeconfig file. In-cluster config is used when unset.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Run under leader election (`--leader-elect` or `--leader-elect=false`).
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    leader_elect: Option<bool>,

    /// How long followers wait before taking over an unrenewed lease.
    #[arg(long, value_parser = duration_arg)]
    leader_elect_lease_duration: Option<Duration>,

    /// How long the leader retries renewing before giving up.
    #[arg(long, value_parser = duration_arg)]
    leader_elect_renew_deadline: Option<Duration>,

    /// Interval between acquire and renew attempts.
    #[arg(long, value_parser = duration_arg)]
    leader_elect_retry_period: Option<Duration>,

    /// Namespace of the leader election lease.
    #[arg(long)]
    lock_namespace: Option<String>,

    /// Name of the leader election lease.
    #[arg(long)]
    lock_name: Option<String>,

    /// Period of the reconciliation tick.
    #[arg(long, value_parser = duration_arg)]
    sync_period: Option<Duration>,

    /// Period of the API discovery refresh.
    #[arg(long, value_parser = duration_arg)]
    discovery_refresh_period: Option<Duration>,

    /// Install or update the CronHPA CRD (`--create-crd=false` to skip).
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    create_crd: Option<bool>,
}

fn duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration {s:?} (expected e.g. 15s, 1m30s)"))
}

impl Cli {
    /// Flags given on the command line win over the environment.
    fn apply(self, config: &mut ControllerConfig) {
        let le = &mut config.leader_election;
        if let Some(path) = self.kubeconfig {
            config.kubeconfig = Some(path);
        }
        if let Some(enabled) = self.leader_elect {
            le.enabled = enabled;
        }
        if let Some(d) = self.leader_elect_lease_duration {
            le.lease_duration = d;
        }
        if let Some(d) = self.leader_elect_renew_deadline {
            le.renew_deadline = d;
        }
        if let Some(d) = self.leader_elect_retry_period {
            le.retry_period = d;
        }
        if let Some(ns) = self.lock_namespace {
            le.lock_namespace = ns;
        }
        if let Some(name) = self.lock_name {
            le.lock_name = name;
        }
        if let Some(d) = self.sync_period {
            config.sync_period = d;
        }
        if let Some(d) = self.discovery_refresh_period {
            config.discovery_refresh_period = d;
        }
        if let Some(create) = self.create_crd {
            config.create_crd = create;
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ControllerConfig::from_env().context("reading configuration")?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let client = build_client(config.kubeconfig.as_deref())
        .await
        .context("creating Kubernetes client")?;

    let cache = Arc::new(MappingCache::new(Arc::new(KubeDiscovery::new(client.clone()))));
    let snapshot = cache.refresh().await.context("initial API discovery")?;
    info!(group_kinds = snapshot.len(), "Discovered scalable resources");

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeScheduleStore::new(client.clone())),
        cache,
        Arc::new(KubeScaleClient::new(client.clone())),
        Arc::new(KubeEventSink::new(
            client.clone(),
            Some(config.leader_election.identity.clone()),
        )),
        &config,
    ));

    let crds = Arc::new(KubeCrdRegistry::new(client.clone()));
    let create_crd = config.create_crd;
    let lead = move |token: CancellationToken| async move {
        if create_crd && !ensure_crd_until_ready(crds.as_ref(), CRD_RETRY_PERIOD, &token).await {
            return;
        }
        reconciler.run(token).await;
    };

    let shutdown = shutdown_token();

    if !config.leader_election.enabled {
        lead(shutdown).await;
        info!("cronhpa-controller exited cleanly");
        return Ok(());
    }

    let le = config.leader_election;
    let lock = Arc::new(KubeLeaseLock::new(client, &le.lock_namespace, &le.lock_name));
    let elector = LeaderElector::new(lock, le)?;
    elector
        .run(shutdown, lead)
        .await
        .context("leader election")?;

    info!("cronhpa-controller exited cleanly");
    Ok(())
}
