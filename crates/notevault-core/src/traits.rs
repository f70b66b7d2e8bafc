//! Repository traits implemented by both backing stores.
//!
//! The relational store (`notevault-db`) and the ephemeral store
//! (`notevault-store`) report identical error kinds for identical conditions,
//! so the service layer and the HTTP adapter never branch on which one is
//! active.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Note, User};

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user. Fails with `AlreadyExists` if the email is taken.
    async fn save(&self, user: User) -> Result<()>;

    /// Look a user up by login key (email). Fails with `NotFound`.
    async fn get_by_login(&self, email: &str) -> Result<User>;

    /// Look a user up by identifier. Fails with `NotFound`.
    async fn get_by_id(&self, uid: &str) -> Result<User>;

    /// List every user. Fails with `NoneAvailable` when there are none.
    async fn list_all(&self) -> Result<Vec<User>>;

    /// Replace the user stored under `uid`. Fails with `NotFound`.
    async fn update_by_id(&self, uid: &str, user: User) -> Result<()>;

    /// Remove the user stored under `uid`. Fails with `NotFound`.
    async fn delete_by_id(&self, uid: &str) -> Result<()>;

    /// Release resources and drain any background loop.
    async fn close(&self) -> Result<()>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Store a new note. Fails with `AlreadyExists` if a live note has the
    /// same title.
    async fn add(&self, note: Note) -> Result<()>;

    /// List live notes. Fails with `NoneAvailable` when there are none.
    async fn list_all(&self) -> Result<Vec<Note>>;

    /// Fetch a live note by identifier. Fails with `NotFound`.
    async fn get_by_id(&self, nid: &str) -> Result<Note>;

    /// Replace the note stored under `nid`. Fails with `NotFound`.
    async fn update_by_id(&self, nid: &str, note: Note) -> Result<()>;

    /// Delete a note: soft-delete in the relational store, physical removal
    /// in the ephemeral store. Fails with `NotFound`.
    async fn delete_by_id(&self, nid: &str) -> Result<()>;
}
