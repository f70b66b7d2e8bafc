use clap::Parser;
use tracing::info;

use notevault_api::{init_tracing, serve, shutdown_signal, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::parse();
    let log_config = config.log_config();
    let _log_guard = init_tracing(&log_config);

    info!(
        log_format = ?log_config.format,
        log_file = %log_config
            .file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(stdout)".to_string()),
        debug = config.debug,
        "Logging initialized"
    );

    let listener = config.bind().await?;
    serve(config, listener, shutdown_signal()).await
}
