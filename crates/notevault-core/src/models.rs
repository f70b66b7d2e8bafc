//! Value types for notes and users.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// NOTES
// =============================================================================

/// Lifecycle status of a note, ordinal-encoded on the wire and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum NoteStatus {
    #[default]
    New,
    Active,
    Inactive,
    Deleted,
}

impl NoteStatus {
    pub const ALL: [NoteStatus; 4] = [
        NoteStatus::New,
        NoteStatus::Active,
        NoteStatus::Inactive,
        NoteStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::New => "New",
            NoteStatus::Active => "Active",
            NoteStatus::Inactive => "Inactive",
            NoteStatus::Deleted => "Deleted",
        }
    }
}

impl From<NoteStatus> for i32 {
    fn from(status: NoteStatus) -> i32 {
        match status {
            NoteStatus::New => 0,
            NoteStatus::Active => 1,
            NoteStatus::Inactive => 2,
            NoteStatus::Deleted => 3,
        }
    }
}

impl TryFrom<i32> for NoteStatus {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NoteStatus::New),
            1 => Ok(NoteStatus::Active),
            2 => Ok(NoteStatus::Inactive),
            3 => Ok(NoteStatus::Deleted),
            other => Err(Error::Serialization(format!(
                "invalid note status ordinal: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Serialization(format!("invalid note status: {}", s)))
    }
}

/// A note record.
///
/// This is also the record format of the ephemeral note file:
/// `{nid, title, description, status, created_at, uid, deleted}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub nid: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
    pub uid: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Request for creating a note. The identifier and timestamp are assigned
/// server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(default)]
    pub uid: String,
}

impl CreateNoteRequest {
    /// Build the stored note for the given identifier.
    pub fn into_note(self, nid: String, created_at: DateTime<Utc>) -> Note {
        Note {
            nid,
            title: self.title,
            description: self.description,
            status: self.status,
            created_at,
            uid: self.uid,
            deleted: false,
        }
    }
}

/// Full replacement of a note's mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: NoteStatus,
}

impl UpdateNoteRequest {
    /// Apply this update on top of an existing note, keeping its identity,
    /// owner and creation time.
    pub fn apply_to(&self, existing: &Note) -> Note {
        Note {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            ..existing.clone()
        }
    }
}

// =============================================================================
// USERS
// =============================================================================

/// A user account.
///
/// `password` holds an Argon2 PHC string and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Registration (and profile update) payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload. The email acts as the login key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
