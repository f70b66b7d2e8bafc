//! # notevault-api
//!
//! HTTP front end for notevault: configuration, logging setup, storage
//! selection, the service layer, axum routes, and the process lifecycle.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod storage;

pub use app::{serve, shutdown_signal};
pub use config::Config;
pub use error::ApiError;
pub use logging::{init_tracing, LogConfig, LogFormat};
pub use routes::{router, AppState};
pub use storage::{select_storage, select_storage_with, StorageMode, StorageSelection};
