//! Ephemeral note repository: an in-memory map mirrored to the note file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use notevault_core::{Error, Note, NoteRepository, Result};

use crate::note_file::{NoteFile, NoteMap};

/// Map-backed note repository. Every mutation rewrites the whole file.
///
/// Deletes are physical. Notes stay in memory after the sync reconciler
/// drains the file, so they are re-persisted by the next mutation.
pub struct FileNoteRepository {
    notes: Mutex<NoteMap>,
    file: Arc<NoteFile>,
    sealed: AtomicBool,
}

impl FileNoteRepository {
    /// Open the repository, loading whatever the file currently holds.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; it is overwritten by the first mutation.
    pub async fn open(file: Arc<NoteFile>) -> Self {
        let loaded = file.lock().await.read().await;
        let notes = match loaded {
            Ok(notes) => {
                info!(
                    subsystem = "store",
                    component = "notes",
                    path = %file.path().display(),
                    count = notes.len(),
                    "Loaded ephemeral notes"
                );
                notes
            }
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "notes",
                    path = %file.path().display(),
                    error = %e,
                    "Failed to load note file, starting empty"
                );
                NoteMap::new()
            }
        };

        Self {
            notes: Mutex::new(notes),
            file,
            sealed: AtomicBool::new(false),
        }
    }

    /// Refuse every later mutation. Waits for an in-flight one to finish, so
    /// once this returns the file is only touched by the reconciler.
    ///
    /// Reads keep working.
    pub async fn seal(&self) {
        let _notes = self.notes.lock().await;
        self.sealed.store(true, Ordering::SeqCst);
        info!(subsystem = "store", component = "notes", "Note store sealed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.sealed.load(Ordering::SeqCst) {
            return Err(Error::Internal("note store is shut down".to_string()));
        }
        Ok(())
    }

    /// The file this repository mirrors to.
    pub fn file(&self) -> &Arc<NoteFile> {
        &self.file
    }

    async fn persist(&self, notes: &NoteMap) -> Result<()> {
        self.file.lock().await.write(notes).await
    }
}

fn title_taken(notes: &NoteMap, title: &str, except_nid: Option<&str>) -> bool {
    notes
        .values()
        .any(|n| n.title == title && Some(n.nid.as_str()) != except_nid)
}

fn note_not_found(nid: &str) -> Error {
    Error::NotFound(format!("Note {} not found", nid))
}

#[async_trait]
impl NoteRepository for FileNoteRepository {
    async fn add(&self, note: Note) -> Result<()> {
        let mut notes = self.notes.lock().await;
        self.ensure_open()?;
        if title_taken(&notes, &note.title, None) {
            return Err(Error::AlreadyExists(format!("note '{}'", note.title)));
        }
        if notes.contains_key(&note.nid) {
            return Err(Error::AlreadyExists(format!("note {}", note.nid)));
        }

        let nid = note.nid.clone();
        notes.insert(nid.clone(), note);
        if let Err(e) = self.persist(&notes).await {
            notes.remove(&nid);
            return Err(e);
        }
        debug!(subsystem = "store", component = "notes", op = "add", nid = %nid, "Note added");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        let notes = self.notes.lock().await;
        if notes.is_empty() {
            return Err(Error::NoneAvailable("notes".to_string()));
        }
        let mut list: Vec<Note> = notes.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.nid.cmp(&b.nid)));
        Ok(list)
    }

    async fn get_by_id(&self, nid: &str) -> Result<Note> {
        self.notes
            .lock()
            .await
            .get(nid)
            .cloned()
            .ok_or_else(|| note_not_found(nid))
    }

    async fn update_by_id(&self, nid: &str, mut note: Note) -> Result<()> {
        let mut notes = self.notes.lock().await;
        self.ensure_open()?;
        if !notes.contains_key(nid) {
            return Err(note_not_found(nid));
        }
        if title_taken(&notes, &note.title, Some(nid)) {
            return Err(Error::AlreadyExists(format!("note '{}'", note.title)));
        }

        note.nid = nid.to_string();
        let previous = notes.insert(nid.to_string(), note);
        if let Err(e) = self.persist(&notes).await {
            if let Some(previous) = previous {
                notes.insert(nid.to_string(), previous);
            }
            return Err(e);
        }
        debug!(subsystem = "store", component = "notes", op = "update", nid, "Note updated");
        Ok(())
    }

    async fn delete_by_id(&self, nid: &str) -> Result<()> {
        let mut notes = self.notes.lock().await;
        self.ensure_open()?;
        let removed = notes.remove(nid).ok_or_else(|| note_not_found(nid))?;
        if let Err(e) = self.persist(&notes).await {
            notes.insert(nid.to_string(), removed);
            return Err(e);
        }
        debug!(subsystem = "store", component = "notes", op = "delete", nid, "Note deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use notevault_core::NoteStatus;

    fn note(nid: &str, title: &str) -> Note {
        Note {
            nid: nid.into(),
            title: title.into(),
            description: "body".into(),
            status: NoteStatus::New,
            created_at: Utc::now(),
            uid: "user1".into(),
            deleted: false,
        }
    }

    async fn open_in(dir: &tempfile::TempDir) -> FileNoteRepository {
        FileNoteRepository::open(Arc::new(NoteFile::new(dir.path().join("notes.json")))).await
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;

        assert!(matches!(repo.list_all().await, Err(Error::NoneAvailable(_))));
        assert!(repo.get_by_id("missing").await.unwrap_err().is_not_found());
        assert!(repo.delete_by_id("missing").await.unwrap_err().is_not_found());
        assert!(repo
            .update_by_id("missing", note("missing", "x"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_title_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;

        repo.add(note("n1", "Test Note")).await.unwrap();
        let err = repo.add(note("n2", "Test Note")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_enforces_title_uniqueness() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;
        repo.add(note("n1", "first")).await.unwrap();
        repo.add(note("n2", "second")).await.unwrap();

        let err = repo.update_by_id("n2", note("n2", "first")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // Keeping its own title is fine.
        let mut same = note("n2", "second");
        same.status = NoteStatus::Inactive;
        repo.update_by_id("n2", same).await.unwrap();
        assert_eq!(repo.get_by_id("n2").await.unwrap().status, NoteStatus::Inactive);
    }

    #[tokio::test]
    async fn test_every_mutation_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;

        repo.add(note("n1", "a")).await.unwrap();
        repo.add(note("n2", "b")).await.unwrap();
        let on_disk = repo.file().lock().await.read().await.unwrap();
        assert_eq!(on_disk.len(), 2);

        let mut changed = note("n1", "a2");
        changed.status = NoteStatus::Active;
        repo.update_by_id("n1", changed).await.unwrap();
        let on_disk = repo.file().lock().await.read().await.unwrap();
        assert_eq!(on_disk["n1"].title, "a2");

        repo.delete_by_id("n2").await.unwrap();
        let on_disk = repo.file().lock().await.read().await.unwrap();
        assert_eq!(on_disk.len(), 1);
        assert!(!on_disk.contains_key("n2"));
    }

    #[tokio::test]
    async fn test_reopen_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let repo = open_in(&dir).await;
            repo.add(note("n1", "kept")).await.unwrap();
        }

        let repo = open_in(&dir).await;
        assert_eq!(repo.get_by_id("n1").await.unwrap().title, "kept");
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "{ broken").unwrap();

        let repo = open_in(&dir).await;
        assert!(matches!(repo.list_all().await, Err(Error::NoneAvailable(_))));

        repo.add(note("n1", "fresh")).await.unwrap();
        assert_eq!(repo.file().lock().await.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_ordered_by_creation() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;

        let mut older = note("b", "older");
        older.created_at = Utc::now() - Duration::minutes(5);
        repo.add(note("a", "newer")).await.unwrap();
        repo.add(older).await.unwrap();

        let titles: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["older", "newer"]);
    }

    #[tokio::test]
    async fn test_notes_survive_file_reset() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;
        repo.add(note("n1", "a")).await.unwrap();

        repo.file().lock().await.reset().await.unwrap();
        assert!(repo.get_by_id("n1").await.is_ok());

        // The next mutation mirrors the whole map again.
        repo.add(note("n2", "b")).await.unwrap();
        assert_eq!(repo.file().lock().await.read().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sealed_store_rejects_writes_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_in(&dir).await;
        repo.add(note("n1", "a")).await.unwrap();

        repo.seal().await;
        repo.file().lock().await.reset().await.unwrap();

        assert!(matches!(repo.add(note("n2", "b")).await, Err(Error::Internal(_))));
        assert!(matches!(
            repo.update_by_id("n1", note("n1", "a2")).await,
            Err(Error::Internal(_))
        ));
        assert!(matches!(repo.delete_by_id("n1").await, Err(Error::Internal(_))));

        let raw = repo.file().lock().await.read_raw().await.unwrap();
        assert_eq!(raw.as_deref(), Some("{}"));
        assert_eq!(repo.get_by_id("n1").await.unwrap().title, "a");
    }
}
