//! # notevault-sync
//!
//! Moves notes staged in the ephemeral note file into the relational store.
//!
//! [`SyncReconciler::sync_to_db`] performs one drain; [`SyncScheduler`] runs
//! it on a fixed interval until shutdown.

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{SyncReconciler, SyncReport};
pub use scheduler::{SyncConfig, SyncScheduler};
