//! Media target type definitions
//!
//! Blacklist and history rows belong either to a Sonarr episode or to a
//! Radarr movie. `MediaKind` picks the table pair and event types,
//! `MediaTarget` additionally carries the identifiers.

use serde::{Deserialize, Serialize};

use super::EventType;

/// Which library a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Episode,
    Movie,
}

impl MediaKind {
    pub(crate) fn blacklist_table(self) -> &'static str {
        match self {
            MediaKind::Episode => "table_blacklist",
            MediaKind::Movie => "table_blacklist_movie",
        }
    }

    pub(crate) fn history_table(self) -> &'static str {
        match self {
            MediaKind::Episode => "table_history",
            MediaKind::Movie => "table_history_movie",
        }
    }

    /// Event emitted after a blacklist mutation
    pub fn blacklist_event(self) -> EventType {
        match self {
            MediaKind::Episode => EventType::EpisodeBlacklist,
            MediaKind::Movie => EventType::MovieBlacklist,
        }
    }

    /// Event emitted after a history insert
    pub fn history_event(self) -> EventType {
        match self {
            MediaKind::Episode => EventType::EpisodeHistory,
            MediaKind::Movie => EventType::MovieHistory,
        }
    }

    /// Event emitted when the item itself (its subtitles) changed
    pub fn item_event(self) -> EventType {
        match self {
            MediaKind::Episode => EventType::Episode,
            MediaKind::Movie => EventType::Movie,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Episode => write!(f, "episode"),
            MediaKind::Movie => write!(f, "movie"),
        }
    }
}

/// A Sonarr episode or a Radarr movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaTarget {
    Episode {
        /// Sonarr series id
        series_id: i64,
        /// Sonarr episode id
        episode_id: i64,
    },
    Movie {
        /// Radarr movie id
        movie_id: i64,
    },
}

impl MediaTarget {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaTarget::Episode { .. } => MediaKind::Episode,
            MediaTarget::Movie { .. } => MediaKind::Movie,
        }
    }
}
