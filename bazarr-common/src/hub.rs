//! Central notifier shared by every mutation path
//!
//! The `EventHub` owns three channels:
//! - the SSE event queue (bounded FIFO, drained by SSE responses)
//! - the toast queue (bounded FIFO, popped by the UI one toast at a time)
//! - a broadcast channel fanning every event out to websocket clients
//!
//! All channels overwrite their oldest entry when full. Producers are never
//! blocked and emitting never fails, whether or not anyone is listening.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::EventsConfig;
use crate::events::{EventType, Toast, UiEvent};
use crate::queue::BoundedQueue;

/// Default SSE event queue capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Default toast queue capacity
pub const DEFAULT_TOAST_CAPACITY: usize = 10;

struct HubInner {
    events: BoundedQueue<UiEvent>,
    toasts: BoundedQueue<Toast>,
    tx: broadcast::Sender<UiEvent>,
}

/// Cloneable handle to the notification channels
///
/// # Examples
///
/// ```
/// use bazarr_common::events::{EventType, UiEvent};
/// use bazarr_common::EventHub;
///
/// let hub = EventHub::default();
/// let mut ws = hub.subscribe();
///
/// hub.emit(UiEvent::new(EventType::Badges));
///
/// assert_eq!(hub.try_next_event().unwrap().event_type, EventType::Badges);
/// assert_eq!(ws.try_recv().unwrap().event_type, EventType::Badges);
/// ```
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

/// Snapshot of queue occupancy, for the status endpoint and logs
#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    pub event_queue_len: usize,
    pub event_queue_capacity: usize,
    pub events_dropped: u64,
    pub toast_queue_len: usize,
    pub toast_queue_capacity: usize,
    pub toasts_dropped: u64,
    pub websocket_subscribers: usize,
}

impl EventHub {
    /// Create a hub with the given queue capacities
    ///
    /// The websocket broadcast channel gets the same capacity as the SSE
    /// event queue.
    pub fn new(event_capacity: usize, toast_capacity: usize) -> Self {
        let events = BoundedQueue::new(event_capacity);
        let toasts = BoundedQueue::new(toast_capacity);
        let (tx, _) = broadcast::channel(events.capacity());

        Self {
            inner: Arc::new(HubInner { events, toasts, tx }),
        }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.event_queue_capacity, config.toast_queue_capacity)
    }

    /// Publish a state-change event to SSE and websocket consumers
    pub fn emit(&self, event: UiEvent) {
        debug!(
            event = event.event_name(),
            action = ?event.action,
            series = ?event.series,
            episode = ?event.episode,
            movie = ?event.movie,
            "Emitting UI event"
        );

        if let Some(evicted) = self.inner.events.push(event.clone()) {
            debug!(
                "SSE event queue full, dropped oldest {} event",
                evicted.event_name()
            );
        }

        // No websocket subscribers is fine
        let _ = self.inner.tx.send(event);
    }

    /// Queue a toast for the UI
    ///
    /// Websocket clients additionally receive a `message` event carrying the
    /// toast; polling clients pop it through `next_toast`.
    pub fn notify(&self, toast: Toast) {
        debug!(severity = ?toast.severity, "Queueing toast: {}", toast.message);

        match serde_json::to_value(&toast) {
            Ok(payload) => {
                let _ = self
                    .inner
                    .tx
                    .send(UiEvent::new(EventType::Message).payload(payload));
            }
            Err(e) => warn!("Failed to serialize toast: {}", e),
        }

        if self.inner.toasts.push(toast).is_some() {
            debug!("Toast queue full, dropped oldest toast");
        }
    }

    /// Shorthand for an info toast
    pub fn show_message(&self, message: impl Into<String>) {
        self.notify(Toast::new(message));
    }

    /// Wait for the next SSE event
    pub async fn next_event(&self) -> UiEvent {
        self.inner.events.recv().await
    }

    pub fn try_next_event(&self) -> Option<UiEvent> {
        self.inner.events.pop()
    }

    /// Pop the oldest pending toast
    pub fn next_toast(&self) -> Option<Toast> {
        self.inner.toasts.pop()
    }

    /// Receiver for the websocket fan-out
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.inner.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            event_queue_len: self.inner.events.len(),
            event_queue_capacity: self.inner.events.capacity(),
            events_dropped: self.inner.events.dropped(),
            toast_queue_len: self.inner.toasts.len(),
            toast_queue_capacity: self.inner.toasts.capacity(),
            toasts_dropped: self.inner.toasts.dropped(),
            websocket_subscribers: self.subscriber_count(),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY, DEFAULT_TOAST_CAPACITY)
    }
}
