use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use notevault_core::{CreateNoteRequest, Error, UpdateNoteRequest};

use super::{json_body, AppState};
use crate::error::ApiError;

/// Reads report a missing note or an empty list as 204.
fn read_error(err: Error) -> ApiError {
    match err {
        Error::NotFound(_) | Error::NoneAvailable(_) => ApiError::NoContent,
        other => other.into(),
    }
}

pub(super) async fn list_notes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let notes = state.notes.list().await.map_err(read_error)?;
    Ok((StatusCode::ACCEPTED, Json(notes)))
}

pub(super) async fn get_note(
    State(state): State<AppState>,
    Path(nid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.get(&nid).await.map_err(read_error)?;
    Ok((StatusCode::ACCEPTED, Json(note)))
}

pub(super) async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    let nid = state.notes.create(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "nid": nid }))))
}

pub(super) async fn update_note(
    State(state): State<AppState>,
    Path(nid): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    state.notes.update(&nid, req).await?;
    Ok(Json(json!({ "nid": nid })))
}

pub(super) async fn delete_note(
    State(state): State<AppState>,
    Path(nid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.notes.delete(&nid).await?;
    Ok(Json(json!({ "nid": nid })))
}
