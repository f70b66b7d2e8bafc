//! # notevault-store
//!
//! Process-local repositories.
//!
//! - [`MemoryUserRepository`]: users in a map, lost on exit. Stands in for
//!   the relational user repository when the database is unreachable.
//! - [`FileNoteRepository`]: notes in a map, mirrored to a [`NoteFile`] on
//!   every mutation. Always serves note requests; the sync reconciler drains
//!   the file into the relational store.

pub mod note_file;
pub mod notes;
pub mod users;

pub use note_file::{NoteFile, NoteFileGuard, NoteMap};
pub use notes::FileNoteRepository;
pub use users::MemoryUserRepository;
