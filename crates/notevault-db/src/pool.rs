//! Relational connection pool.
//!
//! Startup and steady state get separate time limits. `connect_timeout`
//! bounds the one reachability check the storage selector makes before it
//! commits to the relational store. `acquire_timeout` bounds every later
//! wait for a pooled connection, from request handlers, the sync reconciler
//! and the purge loop alike.

use std::io;
use std::time::{Duration, Instant};

use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use tracing::{debug, info, warn};

use notevault_core::defaults;
use notevault_core::{Error, Result};

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Limit on the startup reachability check.
    pub connect_timeout: Duration,
    /// Limit on waiting for a pooled connection once running.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: defaults::DB_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(defaults::DB_CONNECT_TIMEOUT_SECS),
            acquire_timeout: Duration::from_secs(defaults::DB_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(defaults::DB_IDLE_TIMEOUT_SECS),
            max_lifetime: Duration::from_secs(defaults::DB_MAX_LIFETIME_SECS),
        }
    }
}

impl PoolConfig {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Check that `database_url` answers within `connect_timeout`, then build a
/// lazily filled pool around it.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let probe = tokio::time::timeout(config.connect_timeout, PgConnection::connect(database_url))
        .await
        .map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "no answer from the database within {}s",
                    config.connect_timeout.as_secs()
                ),
            ))
        })?
        .map_err(Error::Database)?;
    if let Err(e) = probe.close().await {
        debug!(subsystem = "db", component = "pool", error = %e, "Probe connection closed uncleanly");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_lazy(database_url)
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        duration_ms = start.elapsed().as_millis() as u64,
        "Relational store reachable, pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy after `op`; warn when every connection is checked out.
pub fn log_pool_health(pool: &PgPool, op: &'static str) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;

    if size > 0 && idle == 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            op,
            pool_size = size,
            "Every pooled connection is in use"
        );
    } else {
        debug!(subsystem = "db", component = "pool", op, pool_size = size, pool_idle = idle, "Pool health");
    }
}
