//! Note business rules over a [`NoteRepository`].

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use notevault_core::{CreateNoteRequest, Note, NoteRepository, Result, UpdateNoteRequest};

/// Assigns identifiers and timestamps; everything else passes straight
/// through to the repository.
#[derive(Clone)]
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>) -> Self {
        Self { repo }
    }

    /// Create a note, returning its generated identifier.
    pub async fn create(&self, req: CreateNoteRequest) -> Result<String> {
        let nid = Uuid::new_v4().to_string();
        self.repo.add(req.into_note(nid.clone(), Utc::now())).await?;
        debug!(subsystem = "api", component = "note_service", op = "create", nid = %nid, "Note created");
        Ok(nid)
    }

    pub async fn list(&self) -> Result<Vec<Note>> {
        self.repo.list_all().await
    }

    pub async fn get(&self, nid: &str) -> Result<Note> {
        self.repo.get_by_id(nid).await
    }

    /// Replace title, description and status. Identity, owner and creation
    /// time are kept.
    pub async fn update(&self, nid: &str, req: UpdateNoteRequest) -> Result<()> {
        let existing = self.repo.get_by_id(nid).await?;
        self.repo.update_by_id(nid, req.apply_to(&existing)).await
    }

    pub async fn delete(&self, nid: &str) -> Result<()> {
        self.repo.delete_by_id(nid).await
    }
}
