//! Note repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use notevault_core::{Error, Note, NoteRepository, NoteStatus, Result};

use crate::purge::PurgeNotifier;

const NOTE_COLUMNS: &str = "nid, title, description, status, created_at, uid, deleted";

/// PostgreSQL implementation of NoteRepository.
///
/// Deletes are soft: the row is flagged and the purge loop removes it later.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
    purge: PurgeNotifier,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository feeding soft deletes to `purge`.
    pub fn new(pool: PgPool, purge: PurgeNotifier) -> Self {
        Self { pool, purge }
    }
}

/// Map a database row to a Note.
fn map_row_to_note(row: PgRow) -> Result<Note> {
    let status: i32 = row.try_get("status")?;
    Ok(Note {
        nid: row.try_get("nid")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: NoteStatus::try_from(status)?,
        created_at: row.try_get("created_at")?,
        uid: row.try_get("uid")?,
        deleted: row.try_get("deleted")?,
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn add(&self, note: Note) -> Result<()> {
        sqlx::query(
            "INSERT INTO notes (nid, title, description, status, created_at, uid, deleted)
             VALUES ($1, $2, $3, $4, $5, $6, false)",
        )
        .bind(&note.nid)
        .bind(&note.title)
        .bind(&note.description)
        .bind(i32::from(note.status))
        .bind(note.created_at)
        .bind(&note.uid)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::from_sqlx_unique(e, format!("note '{}'", note.title)))?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE deleted = false ORDER BY created_at ASC",
            NOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        if rows.is_empty() {
            return Err(Error::NoneAvailable("notes".to_string()));
        }
        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn get_by_id(&self, nid: &str) -> Result<Note> {
        let sql = format!(
            "SELECT {} FROM notes WHERE nid = $1 AND deleted = false",
            NOTE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(nid)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => map_row_to_note(row),
            None => Err(Error::NotFound(format!("Note {} not found", nid))),
        }
    }

    async fn update_by_id(&self, nid: &str, note: Note) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes SET title = $1, description = $2, status = $3
             WHERE nid = $4 AND deleted = false",
        )
        .bind(&note.title)
        .bind(&note.description)
        .bind(i32::from(note.status))
        .bind(nid)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::from_sqlx_unique(e, format!("note '{}'", note.title)))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Note {} not found", nid)));
        }
        Ok(())
    }

    async fn delete_by_id(&self, nid: &str) -> Result<()> {
        let result = sqlx::query("UPDATE notes SET deleted = true WHERE nid = $1 AND deleted = false")
            .bind(nid)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Note {} not found", nid)));
        }

        debug!(subsystem = "db", component = "notes", nid, "Note soft-deleted");
        self.purge.notify();
        Ok(())
    }
}
