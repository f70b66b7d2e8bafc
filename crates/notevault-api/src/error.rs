//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// An error as the client sees it: a status code and a `{"error": ...}` body.
///
/// The default conversion from [`notevault_core::Error`] covers most routes;
/// handlers whose table entry differs remap before returning.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    /// Empty body, for read routes that report absence as 204.
    #[error("no content")]
    NoContent,
    /// Empty collection reported as 202.
    #[error("{0}")]
    Accepted(String),
    #[error("{0}")]
    Internal(String),
}

impl From<notevault_core::Error> for ApiError {
    fn from(err: notevault_core::Error) -> Self {
        use notevault_core::Error;
        match err {
            Error::NotFound(msg) | Error::NoneAvailable(msg) => ApiError::BadRequest(msg),
            Error::AlreadyExists(msg) => ApiError::Conflict(msg),
            Error::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".to_string()),
            other => {
                error!(subsystem = "api", component = "handler", error = %other, "Request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NoContent => return StatusCode::NO_CONTENT.into_response(),
            ApiError::Accepted(msg) => (StatusCode::ACCEPTED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notevault_core::Error;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_default_status_mapping() {
        assert_eq!(status_of(Error::NotFound("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::AlreadyExists("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(Error::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(Error::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_no_content_has_no_body() {
        let response = ApiError::NoContent.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(axum::http::header::CONTENT_TYPE).is_none());
    }
}
