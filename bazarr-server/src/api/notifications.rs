//! Toast polling endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::AppState;

/// GET /api/notifications
///
/// Pops the oldest pending toast. Answers 204 when there is none.
pub async fn next_notification(State(state): State<AppState>) -> Response {
    match state.hub.next_toast() {
        Some(toast) => Json(toast).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
