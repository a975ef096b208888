//! # Bazarr Common Library
//!
//! Shared code for the Bazarr notification core:
//! - Bounded ring-buffer queue
//! - UI event and toast types, and the `EventHub` that fans them out
//! - Blacklist and history helpers that pair a database write with an event
//! - Database bootstrap and configuration loading
//! - SSE stream helpers

pub mod blacklist;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod history;
pub mod hub;
pub mod pagination;
pub mod queue;
pub mod sse;
pub mod subtitles;

pub use error::{Error, Result};
pub use events::{EventAction, EventType, MediaKind, MediaTarget, Toast, UiEvent};
pub use hub::EventHub;
pub use queue::BoundedQueue;
