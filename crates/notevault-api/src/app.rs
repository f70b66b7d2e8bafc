//! Process lifecycle: storage selection, background tasks, HTTP serving and
//! ordered shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use notevault_core::NoteRepository;
use notevault_db::PoolConfig;
use notevault_store::{FileNoteRepository, NoteFile};
use notevault_sync::{SyncReconciler, SyncScheduler};

use crate::config::Config;
use crate::routes::{router, AppState};
use crate::storage::select_storage;

/// Run the server on `listener` until `shutdown` resolves.
///
/// Shutdown order:
/// 1. the listener stops accepting and in-flight requests get the grace
///    period, after which the server task is aborted;
/// 2. the sync scheduler stops;
/// 3. the note store is sealed;
/// 4. one final drain of the note file (relational mode only);
/// 5. the user repository closes (purge loop runs its last pass, pool closes).
///
/// Aborting the server task does not stop connections it already accepted.
/// Sealing is what keeps those from rewriting the file after the final drain;
/// their writes fail instead.
pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let storage = select_storage(&config.database_url, PoolConfig::default(), config.purge_config()).await;

    let note_file = Arc::new(NoteFile::new(&config.notes_file));
    let file_notes = Arc::new(FileNoteRepository::open(note_file.clone()).await);
    let notes: Arc<dyn NoteRepository> = file_notes.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    let reconciler = storage.database.as_ref().map(|db| {
        Arc::new(SyncReconciler::new(
            note_file.clone(),
            Arc::new(db.notes.clone()) as Arc<dyn NoteRepository>,
        ))
    });
    match &reconciler {
        Some(reconciler) => {
            let scheduler = SyncScheduler::new(reconciler.clone(), config.sync_config());
            tasks.spawn(scheduler.run(shutdown_rx.clone()));
        }
        None => warn!(
            subsystem = "api",
            component = "lifecycle",
            path = %config.notes_file.display(),
            "No relational store; notes stay in the ephemeral file until a later run drains it"
        ),
    }

    let app = router(AppState::new(notes, storage.users.clone(), storage.mode));
    let local_addr = listener.local_addr()?;
    info!(
        subsystem = "api",
        component = "lifecycle",
        addr = %local_addr,
        storage = %storage.mode,
        "Server listening"
    );

    let mut server_stop = shutdown_rx.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_stop.wait_for(|stop| *stop).await;
            })
            .await
    });

    // Either the signal arrives or the server dies on its own.
    let early_exit = tokio::select! {
        _ = shutdown => None,
        result = &mut server => Some(result),
    };
    info!(subsystem = "api", component = "lifecycle", "Shutting down");
    let _ = shutdown_tx.send(true);

    let server_result = match early_exit {
        Some(result) => Some(result),
        None => tokio::time::timeout(config.shutdown_grace(), &mut server).await.ok(),
    };
    match server_result {
        Some(Ok(Ok(()))) => info!(subsystem = "api", component = "lifecycle", "HTTP server stopped"),
        Some(Ok(Err(e))) => error!(subsystem = "api", component = "lifecycle", error = %e, "HTTP server failed"),
        Some(Err(e)) => error!(subsystem = "api", component = "lifecycle", error = %e, "HTTP server task panicked"),
        None => {
            warn!(
                subsystem = "api",
                component = "lifecycle",
                grace_secs = config.shutdown_grace_secs,
                "Grace period elapsed, aborting in-flight requests"
            );
            server.abort();
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(subsystem = "api", component = "lifecycle", error = %e, "Background task failed");
        }
    }

    file_notes.seal().await;

    if let Some(reconciler) = reconciler {
        if let Err(e) = reconciler.sync_to_db().await {
            error!(subsystem = "api", component = "lifecycle", error = %e, "Final sync failed");
        }
    }

    if let Err(e) = storage.users.close().await {
        error!(subsystem = "api", component = "lifecycle", error = %e, "Failed to close user storage");
    }

    info!(subsystem = "api", component = "lifecycle", "Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(subsystem = "api", component = "lifecycle", error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(subsystem = "api", component = "lifecycle", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(subsystem = "api", component = "lifecycle", "Shutdown signal received");
}
