//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::ApiError;
use crate::AppState;

/// Health check response: status, module name and version
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
///
/// Answers 200 once the database responds, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: "bazarr-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
