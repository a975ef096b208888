//! HTTP API handlers for bazarr-server

pub mod error;
pub mod health;
pub mod notifications;
pub mod sse;
pub mod status;
pub mod ws;

pub use error::ApiError;
pub use health::health_routes;
pub use notifications::next_notification;
pub use sse::event_stream;
pub use status::get_status;
pub use ws::websocket;
