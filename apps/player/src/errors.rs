use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::player::PlayerError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The request is well-formed but the roadmap's current state forbids it.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PlayerError> for AppError {
    fn from(e: PlayerError) -> Self {
        match e {
            PlayerError::RoadmapNotFound(_)
            | PlayerError::UnknownModule(_)
            | PlayerError::UnknownResource { .. }
            | PlayerError::NoView(_) => AppError::NotFound(e.to_string()),
            PlayerError::ModuleLocked { .. }
            | PlayerError::ResourceLocked { .. }
            | PlayerError::BelowThreshold { .. }
            | PlayerError::NotRateable => AppError::Conflict(e.to_string()),
            PlayerError::InvalidRating(_) => AppError::Validation(e.to_string()),
            PlayerError::NotSignedIn => AppError::Unauthorized,
            PlayerError::Backend(e) if e.is_not_found() => AppError::NotFound(e.to_string()),
            PlayerError::Backend(e) => AppError::Backend(e),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_errors_map_to_status_codes() {
        let cases = [
            (PlayerError::RoadmapNotFound("rm".into()), StatusCode::NOT_FOUND),
            (PlayerError::ModuleLocked { module_index: 2 }, StatusCode::CONFLICT),
            (
                PlayerError::BelowThreshold {
                    resource_id: "r".into(),
                    progress_percent: 40,
                    required_percent: 90,
                },
                StatusCode::CONFLICT,
            ),
            (PlayerError::InvalidRating(9), StatusCode::BAD_REQUEST),
            (PlayerError::NotSignedIn, StatusCode::UNAUTHORIZED),
            (
                PlayerError::Backend(BackendError::Api {
                    status: 500,
                    message: "boom".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PlayerError::Backend(BackendError::Api {
                    status: 404,
                    message: "Roadmap not found".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (error, expected) in cases {
            let response = AppError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let (status, code, message) =
            AppError::Internal(anyhow::anyhow!("secret detail")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("secret"));
    }
}
