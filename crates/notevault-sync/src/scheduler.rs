//! Periodic trigger for the reconciler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use notevault_core::defaults;

use crate::reconciler::SyncReconciler;

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time between drains.
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::SYNC_INTERVAL_SECS),
        }
    }
}

impl SyncConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Runs [`SyncReconciler::sync_to_db`] every `interval` until shutdown.
///
/// The scheduler does not drain on shutdown. The caller runs the final
/// drain itself, after the HTTP listener has stopped.
pub struct SyncScheduler {
    reconciler: Arc<SyncReconciler>,
    config: SyncConfig,
}

impl SyncScheduler {
    pub fn new(reconciler: Arc<SyncReconciler>, config: SyncConfig) -> Self {
        Self { reconciler, config }
    }

    /// Spawn the loop. It ends when `shutdown` turns true or its sender drops.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// The loop itself, for callers that manage their own tasks.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            subsystem = "sync",
            component = "scheduler",
            interval_secs = interval.as_secs(),
            "Sync scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    // Failures are retried on the next tick.
                    if let Err(e) = self.reconciler.sync_to_db().await {
                        error!(
                            subsystem = "sync",
                            component = "scheduler",
                            error = %e,
                            "Scheduled sync failed"
                        );
                    }
                }
            }
        }

        info!(subsystem = "sync", component = "scheduler", "Sync scheduler stopped");
    }
}
