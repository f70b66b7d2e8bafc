use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use notevault_core::{Error, LoginRequest, RegisterUserRequest};

use super::{json_body, AppState};
use crate::error::ApiError;

pub(super) async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list().await.map_err(|e| match e {
        Error::NoneAvailable(_) => ApiError::Accepted("No users".to_string()),
        other => other.into(),
    })?;
    Ok(Json(users))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get(&uid).await?;
    Ok(Json(user))
}

pub(super) async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    let uid = state.users.register(req).await?;
    Ok(Json(json!({ "uid": uid })))
}

pub(super) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    // Unknown email and wrong password look the same to the client.
    let uid = state.users.login(req).await.map_err(|e| match e {
        Error::NotFound(_) | Error::InvalidCredentials => {
            ApiError::Unauthorized("Invalid credentials".to_string())
        }
        other => other.into(),
    })?;
    Ok(Json(json!({ "uid": uid })))
}

pub(super) async fn update_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    state.users.update(&uid, req).await?;
    Ok(Json(json!({ "uid": uid })))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(&uid).await?;
    Ok(Json(json!({ "uid": uid })))
}
