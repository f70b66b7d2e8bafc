//! The ephemeral note file.
//!
//! A JSON object mapping note identifier to note record, rewritten in full on
//! every mutation. The same [`NoteFile`] handle is shared by the ephemeral
//! note repository (which rewrites it) and the sync reconciler (which drains
//! and resets it). Every read-modify-write goes through [`NoteFile::lock`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use notevault_core::defaults::EMPTY_NOTE_FILE;
use notevault_core::{Note, Result};

/// Contents of the note file, keyed by note identifier.
pub type NoteMap = HashMap<String, Note>;

/// Handle to the note file on disk.
#[derive(Debug)]
pub struct NoteFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl NoteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take exclusive access to the file.
    pub async fn lock(&self) -> NoteFileGuard<'_> {
        NoteFileGuard {
            path: &self.path,
            _guard: self.lock.lock().await,
        }
    }
}

/// Exclusive access to the note file, held for a whole read-modify-write.
pub struct NoteFileGuard<'a> {
    path: &'a Path,
    _guard: MutexGuard<'a, ()>,
}

impl NoteFileGuard<'_> {
    /// Raw file contents, or `None` when the file does not exist.
    pub async fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse the file. A missing or blank file is an empty map.
    pub async fn read(&self) -> Result<NoteMap> {
        match self.read_raw().await? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(NoteMap::new()),
        }
    }

    /// Replace the file with `notes`, pretty-printed.
    pub async fn write(&self, notes: &NoteMap) -> Result<()> {
        let json = serde_json::to_string_pretty(notes)?;
        self.write_raw(json.as_bytes()).await?;
        debug!(
            subsystem = "store",
            component = "note_file",
            op = "write",
            count = notes.len(),
            "Note file rewritten"
        );
        Ok(())
    }

    /// Reset the file to the canonical empty mapping `{}`.
    pub async fn reset(&self) -> Result<()> {
        self.write_raw(EMPTY_NOTE_FILE.as_bytes()).await
    }

    /// Write via a temp file and rename, so readers never see a torn file.
    async fn write_raw(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "note_file: create_dir_all failed");
                e
            })?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "note_file: File::create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, self.path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %self.path.display(), error = %e, "note_file: rename failed");
            e
        })?;
        Ok(())
    }
}
