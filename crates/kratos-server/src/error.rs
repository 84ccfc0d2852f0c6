use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error as ThisError;

use kratos_lifecycle::LifecycleError;

/// Wire shape for every error: a generic message for the operator
/// plus the underlying detail where one exists.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Lifecycle(err) => match err {
                LifecycleError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid request".to_string(),
                    Some(msg.clone()),
                ),
                LifecycleError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, format!("{} not found", what), None)
                }
                LifecycleError::InvalidTransition { .. } => (
                    StatusCode::BAD_REQUEST,
                    "Invalid state transition".to_string(),
                    Some(err.to_string()),
                ),
                LifecycleError::Store(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Store failure".to_string(),
                    Some(inner.to_string()),
                ),
            },
            ApiError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
                Some(err.to_string()),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %error, "Request failed");
        }

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
