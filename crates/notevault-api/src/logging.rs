//! Tracing subscriber setup. Called once from `main`.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings derived from [`crate::Config`].
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Write to this file (daily rotation) instead of stdout.
    pub file: Option<PathBuf>,
    /// ANSI override; auto-detected for stdout, off for files.
    pub ansi: Option<bool>,
    /// Default the filter to debug instead of info.
    pub debug: bool,
}

impl LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> String {
        let level = if self.debug { "debug" } else { "info" };
        ["notevault_api", "notevault_db", "notevault_store", "notevault_sync", "tower_http"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber.
///
/// Returns the file writer guard when logging to a file; dropping it flushes
/// and stops the background writer, so hold it for the life of the process.
pub fn init_tracing(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter().into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = config.file {
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notevault-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(config.ansi.unwrap_or(false)),
                )
                .init(),
        }
        Some(guard)
    } else {
        match config.format {
            LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
        }
        None
    }
}
