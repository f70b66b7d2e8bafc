//! One-way drain of the ephemeral note file into the relational store.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use notevault_core::{Error, Note, NoteRepository, Result};
use notevault_store::{NoteFile, NoteMap};

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records found in the file.
    pub total: usize,
    /// Records the relational store accepted.
    pub inserted: usize,
    /// Records already present there (an earlier drain got them).
    pub duplicates: usize,
    /// Records that failed or clashed with another relational record, and
    /// were dropped.
    pub failed: usize,
}

/// Reads the note file, inserts every record into `target`, then removes the
/// attempted records from the file.
///
/// Each record gets exactly one insert attempt. A failure is logged and the
/// record is dropped. The file lock is held only while snapshotting and while
/// removing attempted records, never across an insert, so note writes keep
/// going while the relational store is slow or down.
pub struct SyncReconciler {
    file: Arc<NoteFile>,
    target: Arc<dyn NoteRepository>,
}

impl SyncReconciler {
    pub fn new(file: Arc<NoteFile>, target: Arc<dyn NoteRepository>) -> Self {
        Self { file, target }
    }

    /// Drain the file once.
    ///
    /// An absent or empty file is a no-op. A file that does not parse is left
    /// untouched and reported as a serialization error, since no record was
    /// attempted. Records written or changed while the drain ran stay in the
    /// file for the next one; when nothing raced the file ends up as `{}`.
    pub async fn sync_to_db(&self) -> Result<SyncReport> {
        let start = Instant::now();
        let snapshot = self.snapshot().await?;

        if snapshot.is_empty() {
            debug!(subsystem = "sync", component = "reconciler", "Nothing to sync");
            return Ok(SyncReport::default());
        }

        let mut batch: Vec<&Note> = snapshot.values().collect();
        batch.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut report = SyncReport {
            total: batch.len(),
            ..SyncReport::default()
        };

        for note in batch {
            match self.target.add(note.clone()).await {
                Ok(()) => {
                    trace!(subsystem = "sync", component = "reconciler", nid = %note.nid, "Note synced");
                    report.inserted += 1;
                }
                Err(Error::AlreadyExists(what)) => {
                    if self.target.get_by_id(&note.nid).await.is_ok() {
                        debug!(
                            subsystem = "sync",
                            component = "reconciler",
                            nid = %note.nid,
                            "Note already in relational store, skipping"
                        );
                        report.duplicates += 1;
                    } else {
                        warn!(
                            subsystem = "sync",
                            component = "reconciler",
                            nid = %note.nid,
                            conflict = %what,
                            "Note conflicts with an existing relational record, dropping it"
                        );
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        subsystem = "sync",
                        component = "reconciler",
                        nid = %note.nid,
                        error = %e,
                        "Failed to sync note, dropping it"
                    );
                    report.failed += 1;
                }
            }
        }

        let kept = self.release(&snapshot).await?;

        info!(
            subsystem = "sync",
            component = "reconciler",
            count = report.total,
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.failed,
            kept,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note file synced"
        );
        Ok(report)
    }

    async fn snapshot(&self) -> Result<NoteMap> {
        let guard = self.file.lock().await;
        match guard.read().await {
            Ok(notes) => Ok(notes),
            Err(e @ Error::Serialization(_)) => {
                error!(
                    subsystem = "sync",
                    component = "reconciler",
                    path = %self.file.path().display(),
                    error = %e,
                    "Note file is corrupt, leaving it for inspection"
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop every record that is still exactly as snapshotted. Returns how
    /// many records remain in the file.
    async fn release(&self, attempted: &NoteMap) -> Result<usize> {
        let guard = self.file.lock().await;
        let mut current = guard.read().await?;
        current.retain(|nid, note| attempted.get(nid) != Some(&*note));

        if current.is_empty() {
            guard.reset().await?;
        } else {
            debug!(
                subsystem = "sync",
                component = "reconciler",
                kept = current.len(),
                "Notes changed during sync, keeping them for the next pass"
            );
            guard.write(&current).await?;
        }
        Ok(current.len())
    }
}
