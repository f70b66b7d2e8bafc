//! Service layer consumed by the HTTP handlers.

pub mod note_service;
pub mod user_service;

pub use note_service::NoteService;
pub use user_service::UserService;
