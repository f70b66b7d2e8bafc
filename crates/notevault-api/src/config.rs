//! Server configuration from command-line flags and environment.
//!
//! Every flag has an environment fallback; `.env` is loaded before parsing.
//!
//! | Flag | Env | Default |
//! |------|-----|---------|
//! | `--host` | `NOTES_HOST` | `0.0.0.0` |
//! | `--port` | `NOTES_PORT` | `8080` |
//! | `--debug` | `NOTES_DEBUG` | `false` |
//! | `--db` | `NOTES_DB` | local postgres |
//! | `--notes-file` | `NOTES_FILE` | `storage/notes.json` |
//! | `--sync-interval-secs` | `NOTES_SYNC_INTERVAL_SECS` | `300` |
//! | `--purge-interval-secs` | `NOTES_PURGE_INTERVAL_SECS` | `60` |
//! | `--shutdown-grace-secs` | `NOTES_SHUTDOWN_GRACE_SECS` | `5` |
//! | `--log-format` | `LOG_FORMAT` | `text` |
//! | `--log-file` | `LOG_FILE` | stdout only |
//! | `--log-ansi` | `LOG_ANSI` | auto |

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use notevault_core::defaults;
use notevault_core::{Error, Result};
use notevault_db::PurgeConfig;
use notevault_sync::SyncConfig;

use crate::logging::{LogConfig, LogFormat};

#[derive(Parser, Debug, Clone)]
#[command(name = "notevault-api")]
#[command(version, about = "Notes and users HTTP server with ephemeral fallback storage")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "NOTES_HOST", default_value = defaults::HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "NOTES_PORT", default_value_t = defaults::PORT)]
    pub port: u16,

    /// Verbose logging
    #[arg(long, env = "NOTES_DEBUG")]
    pub debug: bool,

    /// PostgreSQL connection string
    #[arg(long = "db", env = "NOTES_DB", default_value = defaults::DATABASE_URL)]
    pub database_url: String,

    /// Ephemeral note file
    #[arg(long, env = "NOTES_FILE", default_value = defaults::NOTES_FILE)]
    pub notes_file: PathBuf,

    /// Seconds between note file drains
    #[arg(long, env = "NOTES_SYNC_INTERVAL_SECS", default_value_t = defaults::SYNC_INTERVAL_SECS)]
    pub sync_interval_secs: u64,

    /// Seconds between purge passes
    #[arg(long, env = "NOTES_PURGE_INTERVAL_SECS", default_value_t = defaults::PURGE_INTERVAL_SECS)]
    pub purge_interval_secs: u64,

    /// Seconds in-flight requests get to finish on shutdown
    #[arg(long, env = "NOTES_SHUTDOWN_GRACE_SECS", default_value_t = defaults::SHUTDOWN_GRACE_SECS)]
    pub shutdown_grace_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write logs to this file (rotated daily)
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Force ANSI colors on or off
    #[arg(long, env = "LOG_ANSI")]
    pub log_ansi: Option<bool>,
}

impl Config {
    /// Bind the listener. `host` may be an IP literal or a resolvable name.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::Config(format!("cannot listen on {}:{}: {}", self.host, self.port, e)))
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format,
            file: self.log_file.clone(),
            ansi: self.log_ansi,
            debug: self.debug,
        }
    }

    pub fn purge_config(&self) -> PurgeConfig {
        PurgeConfig::default().with_interval(Duration::from_secs(self.purge_interval_secs.max(1)))
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default().with_interval(Duration::from_secs(self.sync_interval_secs.max(1)))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
