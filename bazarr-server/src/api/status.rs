//! Notification channel status

use axum::{extract::State, Json};
use bazarr_common::hub::HubStats;

use crate::AppState;

/// GET /api/status
///
/// Queue occupancy, drop counters and connected websocket clients.
pub async fn get_status(State(state): State<AppState>) -> Json<HubStats> {
    Json(state.hub.stats())
}
