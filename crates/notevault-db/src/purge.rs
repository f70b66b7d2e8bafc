//! Background batch purge of soft-deleted notes.
//!
//! Soft deletes only flip the `deleted` flag. A single background loop
//! physically removes flagged rows in bounded batches when any of three
//! triggers fires:
//!
//! - the interval ticker,
//! - enough soft-delete notifications have accumulated (`batch_size`),
//! - the stop signal (one final pass, then the loop ends).
//!
//! Notifications travel over a bounded channel and are sent without
//! blocking: when the channel is full the notification is dropped and the
//! ticker picks the rows up later.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use notevault_core::defaults;
use notevault_core::{Error, Result};

use crate::pool::log_pool_health;

/// Purge loop configuration.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Interval between scheduled passes.
    pub interval: Duration,
    /// Maximum rows removed per pass; also the notification threshold.
    pub batch_size: usize,
    /// Capacity of the soft-delete notification channel.
    pub channel_capacity: usize,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::PURGE_INTERVAL_SECS),
            batch_size: defaults::PURGE_BATCH_SIZE,
            channel_capacity: defaults::PURGE_CHANNEL_CAPACITY,
        }
    }
}

impl PurgeConfig {
    /// Set the interval between scheduled passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-pass batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the notification channel capacity (minimum 1).
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

/// Something that can physically remove a bounded batch of soft-deleted rows.
#[async_trait]
pub trait PurgeTarget: Send + Sync + 'static {
    /// Remove at most `limit` soft-deleted rows, returning how many went.
    async fn purge_batch(&self, limit: usize) -> Result<u64>;
}

/// PostgreSQL purge target for the `notes` table.
#[derive(Clone)]
pub struct PgPurgeTarget {
    pool: PgPool,
}

impl PgPurgeTarget {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurgeTarget for PgPurgeTarget {
    async fn purge_batch(&self, limit: usize) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // SKIP LOCKED: concurrent passes never contend on the same victims.
        let result = sqlx::query(
            "DELETE FROM notes
             WHERE nid IN (
                 SELECT nid FROM notes
                 WHERE deleted = true
                 LIMIT $1
                 FOR UPDATE SKIP LOCKED
             )",
        )
        .bind(limit as i64)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        log_pool_health(&self.pool, "purge");
        Ok(result.rows_affected())
    }
}

/// Cheap, cloneable handle used by soft-delete calls to nudge the loop.
#[derive(Clone)]
pub struct PurgeNotifier {
    tx: mpsc::Sender<()>,
}

impl PurgeNotifier {
    /// Record one soft delete. Never blocks; dropped when the channel is full.
    pub fn notify(&self) {
        if let Err(e) = self.tx.try_send(()) {
            trace!(
                subsystem = "db",
                component = "purge",
                reason = %e,
                "Purge notification dropped"
            );
        }
    }
}

/// Handle owning the running purge loop.
pub struct PurgeLoop {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PurgeLoop {
    /// Spawn the loop on the current runtime.
    pub fn spawn<T: PurgeTarget>(target: T, config: PurgeConfig) -> (Self, PurgeNotifier) {
        let (notify_tx, notify_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(run(target, config, notify_rx, shutdown_rx));

        (
            Self {
                shutdown_tx,
                handle,
            },
            PurgeNotifier { tx: notify_tx },
        )
    }

    /// Signal the loop, wait for its final pass, and join it.
    pub async fn stop(self) -> Result<()> {
        // Err means the loop already ended; joining below still applies.
        let _ = self.shutdown_tx.send(());
        self.handle
            .await
            .map_err(|e| Error::Internal(format!("purge loop panicked: {}", e)))
    }
}

async fn run<T: PurgeTarget>(
    target: T,
    config: PurgeConfig,
    mut notify_rx: mpsc::Receiver<()>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let batch_size = config.batch_size.max(1);
    let mut ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        subsystem = "db",
        component = "purge",
        interval_secs = config.interval.as_secs(),
        batch_size,
        "Purge loop started"
    );

    // Notifications received since the last pass.
    let mut pending = 0usize;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                purge_once(&target, batch_size, "shutdown").await;
                break;
            }
            _ = ticker.tick() => {
                purge_once(&target, batch_size, "interval").await;
                drain(&mut notify_rx);
                pending = 0;
            }
            Some(()) = notify_rx.recv() => {
                pending += 1;
                if pending + notify_rx.len() >= batch_size {
                    purge_once(&target, batch_size, "threshold").await;
                    drain(&mut notify_rx);
                    pending = 0;
                }
            }
        }
    }

    info!(subsystem = "db", component = "purge", "Purge loop stopped");
}

/// Discard queued notifications; the pass that just ran covers them.
fn drain(notify_rx: &mut mpsc::Receiver<()>) -> usize {
    let mut drained = 0;
    while notify_rx.try_recv().is_ok() {
        drained += 1;
    }
    drained
}

async fn purge_once<T: PurgeTarget>(target: &T, batch_size: usize, trigger: &'static str) {
    let start = Instant::now();
    match target.purge_batch(batch_size).await {
        Ok(purged) => {
            debug!(
                subsystem = "db",
                component = "purge",
                trigger,
                purged,
                duration_ms = start.elapsed().as_millis() as u64,
                "Purge pass complete"
            );
        }
        Err(e) => {
            // Rows stay flagged; the next pass retries them.
            error!(
                subsystem = "db",
                component = "purge",
                trigger,
                error = %e,
                "Purge pass failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in: a count of flagged rows and a log of passes.
    #[derive(Clone, Default)]
    struct FakeTarget {
        flagged: Arc<Mutex<u64>>,
        passes: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl PurgeTarget for FakeTarget {
        async fn purge_batch(&self, limit: usize) -> Result<u64> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Internal("connection reset".into()));
            }
            let mut flagged = self.flagged.lock().unwrap();
            let removed = (*flagged).min(limit as u64);
            *flagged -= removed;
            Ok(removed)
        }
    }

    fn config() -> PurgeConfig {
        PurgeConfig::default()
            .with_interval(Duration::from_secs(60))
            .with_batch_size(10)
            .with_channel_capacity(100)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_triggers_purge() {
        let target = FakeTarget::default();
        *target.flagged.lock().unwrap() = 10;
        let (purge, notifier) = PurgeLoop::spawn(target.clone(), config());

        for _ in 0..9 {
            notifier.notify();
        }
        settle().await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 0);

        notifier.notify();
        settle().await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 1);
        assert_eq!(*target.flagged.lock().unwrap(), 0);

        purge.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_is_bounded_by_batch_size() {
        let target = FakeTarget::default();
        *target.flagged.lock().unwrap() = 15;
        let (purge, notifier) = PurgeLoop::spawn(target.clone(), config());

        for _ in 0..10 {
            notifier.notify();
        }
        settle().await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 1);
        assert_eq!(*target.flagged.lock().unwrap(), 5);

        // The next scheduled pass removes the remainder.
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 2);
        assert_eq!(*target.flagged.lock().unwrap(), 0);

        purge.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_triggers_purge() {
        let target = FakeTarget::default();
        *target.flagged.lock().unwrap() = 3;
        let (purge, _notifier) = PurgeLoop::spawn(target.clone(), config());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 1);
        assert_eq!(*target.flagged.lock().unwrap(), 0);

        purge.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_runs_final_pass() {
        let target = FakeTarget::default();
        *target.flagged.lock().unwrap() = 2;
        let (purge, notifier) = PurgeLoop::spawn(target.clone(), config());

        notifier.notify();
        notifier.notify();
        settle().await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 0);

        purge.stop().await.unwrap();
        assert_eq!(target.passes.load(Ordering::SeqCst), 1);
        assert_eq!(*target.flagged.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pass_keeps_loop_alive() {
        let target = FakeTarget {
            fail: true,
            ..FakeTarget::default()
        };
        let (purge, _notifier) = PurgeLoop::spawn(target.clone(), config());

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 2);

        purge.stop().await.unwrap();
        assert_eq!(target.passes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(2);
        let notifier = PurgeNotifier { tx };

        for _ in 0..5 {
            notifier.notify();
        }
        assert_eq!(drain(&mut rx), 2);
    }
}
