//! Server-Sent Events (SSE) for UI state changes

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/events - SSE event stream
///
/// Drains the shared event queue in FIFO order. Each frame carries the event
/// type in `event:` and the JSON event in `data:`. The stream ends when the
/// server shuts down.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    bazarr_common::sse::create_event_sse_stream(
        state.hub.clone(),
        state.sse_keep_alive,
        state.shutdown_receiver(),
    )
}
