//! # notevault-core
//!
//! Core types, traits, and abstractions for the notevault service.
//!
//! This crate provides the value types (notes, users), the shared error
//! taxonomy, and the repository traits that both the relational and the
//! ephemeral backing stores implement.
//!
//! ## Logging conventions
//!
//! Events carry `subsystem` (`api`, `db`, `store`, `sync`), `component`, and
//! where useful `op`, `nid`, `uid`, `count`, `duration_ms`, `error`.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Failed background pass (sync, purge), requires attention |
//! | WARN  | Recoverable issue, automatic fallback applied (degraded storage) |
//! | INFO  | Lifecycle events (startup, shutdown), pass completions |
//! | DEBUG | Decision points, per-request outcomes |
//! | TRACE | Per-record iteration |

pub mod defaults;
pub mod error;
pub mod models;
pub mod password;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
