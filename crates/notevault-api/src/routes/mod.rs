//! HTTP routes.
//!
//! Thin adapters over [`NoteService`] and [`UserService`]. Status codes per
//! route follow the established client contract (reads return 202 for notes,
//! 204 for absent notes, 400 for absent users on mutation).

mod notes;
mod users;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use notevault_core::{NoteRepository, UserRepository};

use crate::error::ApiError;
use crate::services::{NoteService, UserService};
use crate::storage::StorageMode;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub users: UserService,
    pub storage: StorageMode,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        users: Arc<dyn UserRepository>,
        storage: StorageMode,
    ) -> Self {
        Self {
            notes: NoteService::new(notes),
            users: UserService::new(users),
            storage,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users/profile", get(users::list_users))
        .route("/users/profile/:id", get(users::get_user))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/upd/:id", put(users::update_user))
        .route("/users/del/:id", delete(users::delete_user))
        .route("/notes/list", get(notes::list_notes))
        .route("/notes/list/:id", get(notes::get_note))
        .route("/notes/add", post(notes::create_note))
        .route("/notes/upd/:id", put(notes::update_note))
        .route("/notes/del/:id", delete(notes::delete_note))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: StorageMode,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.storage,
    })
}

/// Unwrap a JSON body, reporting any rejection as 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text())))
}
