//! Handler error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors returned by API handlers as `{"error": "..."}` bodies
#[derive(Debug)]
pub enum ApiError {
    /// Database unreachable or query failed
    Unavailable(String),
    Internal(String),
}

impl From<bazarr_common::Error> for ApiError {
    fn from(err: bazarr_common::Error) -> Self {
        match err {
            bazarr_common::Error::Database(e) => ApiError::Unavailable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("Database error: {}", msg))
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
        };
        error!("{}", message);

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
