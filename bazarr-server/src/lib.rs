//! bazarr-server library - notification endpoints
//!
//! Serves the live-update channels of the Bazarr UI: an SSE stream and a
//! websocket fed by the shared `EventHub`, a toast polling endpoint, a status
//! endpoint and a health probe.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use bazarr_common::EventHub;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Notification channels fed by every mutation path
    pub hub: EventHub,
    /// Interval between SSE keep-alive comments
    pub sse_keep_alive: Duration,
    /// Flips to true when long-lived streams must close
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, hub: EventHub, sse_keep_alive: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            db,
            hub,
            sse_keep_alive,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Receiver watched by SSE and websocket streams
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ask every open SSE / websocket stream to finish
    pub fn begin_shutdown(&self) {
        info!("Closing live update streams");
        self.shutdown.send_replace(true);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/events", get(api::event_stream))
        .route("/api/ws", get(api::websocket))
        .route("/api/notifications", get(api::next_notification))
        .route("/api/status", get(api::get_status));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
