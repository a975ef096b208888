//! Server-Sent Events (SSE) utilities
//!
//! Turns the hub's event queue into an axum SSE response.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::events::UiEvent;
use crate::hub::EventHub;

/// Build the SSE frame for one event
///
/// `event:` carries the event type and `data:` the JSON body. Returns `None`
/// when the event cannot be serialized.
pub fn to_sse_event(event: &UiEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_name()).data(json)),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", event.event_name(), e);
            None
        }
    }
}

/// SSE stream draining the hub's event queue in FIFO order
///
/// The queue is shared: with several SSE clients connected each event goes
/// to exactly one of them. A keep-alive comment is sent every `keep_alive`
/// while the queue is idle. The stream ends once `shutdown` flips to true or
/// its sender is dropped.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     bazarr_common::sse::create_event_sse_stream(
///         state.hub.clone(),
///         Duration::from_secs(15),
///         state.shutdown_receiver(),
///     )
/// }
/// ```
pub fn create_event_sse_stream(
    hub: EventHub,
    keep_alive: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let stream = async_stream::stream! {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let event = tokio::select! {
                event = hub.next_event() => event,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };
            debug!("SSE: Sending {} event", event.event_name());
            if let Some(frame) = to_sse_event(&event) {
                yield Ok(frame);
            }
        }
        debug!("SSE: stream closed for shutdown");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive).text("heartbeat"))
}
