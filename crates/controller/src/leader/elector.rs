//! [`LeaderElector`]: acquire, hold and renew a [`LeaseLock`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cronhpa_core::LeaderElectionConfig;

use crate::error::{ClientError, LeaderError};

use super::lock::{LeaseLock, LeaseRecord};

/// Lease duration written when releasing, so followers take over at once.
const RELEASED_LEASE_DURATION: Duration = Duration::from_secs(1);

/// The last record seen and when this candidate first saw it.
struct Observed {
    record: LeaseRecord,
    at: Instant,
}

enum RenewExit {
    Shutdown,
    LeadFinished,
    Lost,
}

pub struct LeaderElector {
    lock: Arc<dyn LeaseLock>,
    config: LeaderElectionConfig,
    is_leader: AtomicBool,
    observed: Mutex<Option<Observed>>,
}

impl LeaderElector {
    pub fn new(lock: Arc<dyn LeaseLock>, config: LeaderElectionConfig) -> Result<Self, LeaderError> {
        config.validate()?;
        Ok(Self {
            lock,
            config,
            is_leader: AtomicBool::new(false),
            observed: Mutex::new(None),
        })
    }

    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    /// Whether this candidate currently holds the lease.
    pub fn is_leader(&self) -> bool {
        self.is_leader.load(Ordering::SeqCst)
    }

    /// Campaign for the lease and run `lead` while holding it.
    ///
    /// Blocks as a follower until the lease is acquired or `shutdown` fires.
    /// Once leading, `lead` is spawned with a child of `shutdown` and the
    /// lease is renewed every retry period. A renewal that does not succeed
    /// within the renew deadline cancels the child token and returns
    /// [`LeaderError::LeadershipLost`]; what to do about it is up to the
    /// caller.
    pub async fn run<F, Fut>(&self, shutdown: CancellationToken, lead: F) -> Result<(), LeaderError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        info!(
            lock = %self.lock.describe(),
            identity = %self.config.identity,
            "Attempting to acquire leader lease"
        );
        if !self.acquire(&shutdown).await {
            info!("Shutdown before acquiring leader lease");
            return Ok(());
        }

        self.is_leader.store(true, Ordering::SeqCst);
        info!(
            lock = %self.lock.describe(),
            identity = %self.config.identity,
            "Acquired leader lease"
        );

        let token = shutdown.child_token();
        let mut leading = tokio::spawn(lead(token.clone()));
        let exit = self.renew(&shutdown, &mut leading).await;

        token.cancel();
        self.is_leader.store(false, Ordering::SeqCst);
        if !matches!(exit, RenewExit::LeadFinished) {
            if let Err(e) = leading.await {
                warn!(error = %e, "Leader task panicked");
            }
        }

        match exit {
            RenewExit::Lost => {
                warn!(
                    lock = %self.lock.describe(),
                    identity = %self.config.identity,
                    "Leader lease lost"
                );
                Err(LeaderError::LeadershipLost {
                    lock: self.lock.describe(),
                    renew_deadline: self.config.renew_deadline,
                })
            }
            RenewExit::Shutdown | RenewExit::LeadFinished => {
                if self.config.release_on_cancel {
                    self.release().await;
                }
                Ok(())
            }
        }
    }

    /// Retry until the lease is ours; `false` if `shutdown` fired first.
    async fn acquire(&self, shutdown: &CancellationToken) -> bool {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return false,
                result = self.try_acquire_or_renew() => match result {
                    Ok(true) => return true,
                    Ok(false) => {}
                    Err(e) => debug!(error = %e, "failed to acquire leader lease"),
                },
            }
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return false,
                _ = sleep(self.config.retry_period) => {}
            }
        }
    }

    /// Keep renewing until shutdown, the lead task ends, or a renewal misses
    /// the renew deadline.
    async fn renew(&self, shutdown: &CancellationToken, leading: &mut JoinHandle<()>) -> RenewExit {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return RenewExit::Shutdown,
                result = &mut *leading => {
                    if let Err(e) = result {
                        warn!(error = %e, "Leader task panicked");
                    }
                    return RenewExit::LeadFinished;
                }
                _ = sleep(self.config.retry_period) => {}
            }

            let deadline = Instant::now() + self.config.renew_deadline;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return RenewExit::Shutdown,
                renewed = timeout_at(deadline, self.renew_until_success()) => {
                    if renewed.is_err() {
                        return RenewExit::Lost;
                    }
                }
            }
        }
    }

    async fn renew_until_success(&self) {
        loop {
            match self.try_acquire_or_renew().await {
                Ok(true) => return,
                Ok(false) => debug!("lease held by another candidate, retrying renewal"),
                Err(e) => warn!(error = %e, "Failed to renew leader lease"),
            }
            sleep(self.config.retry_period).await;
        }
    }

    /// One acquire-or-renew attempt; `Ok(true)` when the lease is ours.
    async fn try_acquire_or_renew(&self) -> Result<bool, ClientError> {
        let now = Utc::now();
        let mut desired = LeaseRecord {
            holder_identity: self.config.identity.clone(),
            lease_duration: self.config.lease_duration,
            acquire_time: now,
            renew_time: now,
            leader_transitions: 0,
        };

        let Some(current) = self.lock.get().await? else {
            self.lock.create(&desired).await?;
            self.observe(desired);
            return Ok(true);
        };

        self.observe(current.record.clone());
        let held_by_us = current.record.holder_identity == self.config.identity;
        if !held_by_us && !current.record.holder_identity.is_empty() && !self.observed_expired() {
            debug!(holder = %current.record.holder_identity, "lease held by another candidate");
            return Ok(false);
        }

        if held_by_us {
            desired.acquire_time = current.record.acquire_time;
            desired.leader_transitions = current.record.leader_transitions;
        } else {
            desired.leader_transitions = current.record.leader_transitions + 1;
        }

        self.lock.update(&desired, &current.version).await?;
        self.observe(desired);
        Ok(true)
    }

    /// Clear the holder so a follower can take over without waiting.
    async fn release(&self) {
        let current = match self.lock.get().await {
            Ok(Some(current)) => current,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read leader lease for release");
                return;
            }
        };
        if current.record.holder_identity != self.config.identity {
            return;
        }

        let now = Utc::now();
        let released = LeaseRecord {
            holder_identity: String::new(),
            lease_duration: RELEASED_LEASE_DURATION,
            acquire_time: now,
            renew_time: now,
            leader_transitions: current.record.leader_transitions,
        };
        match self.lock.update(&released, &current.version).await {
            Ok(()) => info!(lock = %self.lock.describe(), "Released leader lease"),
            Err(e) => warn!(error = %e, "Failed to release leader lease"),
        }
    }

    /// Remember `record`, restarting the expiry clock only if it changed.
    fn observe(&self, record: LeaseRecord) {
        let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        match observed.as_ref() {
            Some(prev) if prev.record == record => {}
            _ => {
                *observed = Some(Observed {
                    record,
                    at: Instant::now(),
                })
            }
        }
    }

    fn observed_expired(&self) -> bool {
        let observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        match observed.as_ref() {
            Some(o) => o.at + o.record.lease_duration <= Instant::now(),
            None => true,
        }
    }
}
