//! Event types for the Bazarr notification system
//!
//! A `UiEvent` tells connected clients that something changed and which
//! items to refresh. Events are small: a type, an action and the
//! Sonarr/Radarr identifiers of the affected item. Clients re-fetch the
//! details themselves.

mod media_types;
mod toast_types;

pub use media_types::{MediaKind, MediaTarget};
pub use toast_types::{Toast, ToastButton, ToastDuration, ToastSeverity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Series,
    Episode,
    Movie,
    /// Wanted/missing counters shown in the navigation badges
    Badges,
    EpisodeHistory,
    MovieHistory,
    EpisodeBlacklist,
    MovieBlacklist,
    /// Toast message, payload carries the `Toast`
    Message,
    Task,
    Settings,
    Languages,
}

impl EventType {
    /// Wire name, also used as the SSE `event:` field
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Series => "series",
            EventType::Episode => "episode",
            EventType::Movie => "movie",
            EventType::Badges => "badges",
            EventType::EpisodeHistory => "episode-history",
            EventType::MovieHistory => "movie-history",
            EventType::EpisodeBlacklist => "episode-blacklist",
            EventType::MovieBlacklist => "movie-blacklist",
            EventType::Message => "message",
            EventType::Task => "task",
            EventType::Settings => "settings",
            EventType::Languages => "languages",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How it changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    #[default]
    Update,
    Delete,
}

/// State-change event pushed to UI clients
///
/// # Examples
///
/// ```
/// use bazarr_common::events::{EventAction, EventType, UiEvent};
///
/// let event = UiEvent::new(EventType::Episode)
///     .series(12)
///     .episode(345);
///
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["type"], "episode");
/// assert_eq!(json["action"], "update");
/// assert_eq!(json["series"], 12);
/// assert!(json["movie"].is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub action: EventAction,
    #[serde(default)]
    pub series: Option<i64>,
    #[serde(default)]
    pub episode: Option<i64>,
    #[serde(default)]
    pub movie: Option<i64>,
    /// Optional inline data (e.g. the toast for `message` events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl UiEvent {
    /// `update` event without identifiers
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            action: EventAction::Update,
            series: None,
            episode: None,
            movie: None,
            payload: None,
            timestamp: Utc::now(),
        }
    }

    /// Event carrying the identifiers of `target`
    pub fn for_target(event_type: EventType, target: &MediaTarget) -> Self {
        let event = Self::new(event_type);
        match *target {
            MediaTarget::Episode {
                series_id,
                episode_id,
            } => event.series(series_id).episode(episode_id),
            MediaTarget::Movie { movie_id } => event.movie(movie_id),
        }
    }

    pub fn action(mut self, action: EventAction) -> Self {
        self.action = action;
        self
    }

    pub fn series(mut self, series_id: i64) -> Self {
        self.series = Some(series_id);
        self
    }

    pub fn episode(mut self, episode_id: i64) -> Self {
        self.episode = Some(episode_id);
        self
    }

    pub fn movie(mut self, movie_id: i64) -> Self {
        self.movie = Some(movie_id);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Event name for SSE `event:` fields and log lines
    pub fn event_name(&self) -> &'static str {
        self.event_type.as_str()
    }
}
