//! Subtitle file mutation points
//!
//! Downloading, deleting or re-syncing a subtitle file changes what the UI
//! shows in several places at once. Each function here writes the history
//! row, then tells clients to refresh the item, its series (for episodes)
//! and the wanted badges, and finally posts a toast.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::events::{EventType, MediaTarget, Toast, ToastSeverity, UiEvent};
use crate::history::{history_log, HistoryAction, NewHistoryEntry};
use crate::hub::EventHub;
use crate::{Error, Result};

/// How a subtitle file got onto disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOrigin {
    /// Picked by the automatic search
    Automatic,
    /// Picked by the user from a manual search
    Manual,
    /// Replaced an existing subtitle with a better scored one
    Upgrade,
    /// Uploaded by the user
    Upload,
}

impl DownloadOrigin {
    pub fn history_action(self) -> HistoryAction {
        match self {
            DownloadOrigin::Automatic => HistoryAction::Downloaded,
            DownloadOrigin::Manual => HistoryAction::ManuallyDownloaded,
            DownloadOrigin::Upgrade => HistoryAction::Upgraded,
            DownloadOrigin::Upload => HistoryAction::Uploaded,
        }
    }
}

/// A subtitle file that was just written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDownload {
    pub target: MediaTarget,
    pub origin: DownloadOrigin,
    /// Display name of the language, e.g. "English"
    pub language: String,
    /// Provider name; `None` for uploads
    pub provider: Option<String>,
    pub subs_id: Option<String>,
    /// Match score in percent
    pub score: Option<i64>,
    pub video_path: Option<String>,
    pub subtitles_path: Option<String>,
}

/// A subtitle file that was removed from disk
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDeletion {
    pub target: MediaTarget,
    pub language: String,
    pub video_path: Option<String>,
    pub subtitles_path: Option<String>,
}

/// Human readable summary used for the history description and the toast
pub fn download_message(download: &SubtitleDownload) -> String {
    let provider = download.provider.as_deref().unwrap_or("unknown provider");
    let mut message = match download.origin {
        DownloadOrigin::Upload => format!("{} subtitles uploaded", download.language),
        DownloadOrigin::Upgrade => {
            format!("{} subtitles upgraded from {}", download.language, provider)
        }
        DownloadOrigin::Automatic | DownloadOrigin::Manual => {
            format!("{} subtitles downloaded from {}", download.language, provider)
        }
    };

    if let Some(score) = download.score {
        message.push_str(&format!(" with a score of {}%", score));
    }
    message.push('.');
    message
}

fn emit_item_refresh(hub: &EventHub, target: &MediaTarget) {
    hub.emit(UiEvent::for_target(target.kind().item_event(), target));
    if let MediaTarget::Episode { series_id, .. } = target {
        hub.emit(UiEvent::new(EventType::Series).series(*series_id));
    }
    hub.emit(UiEvent::new(EventType::Badges));
}

fn require_language(language: &str) -> Result<()> {
    if language.trim().is_empty() {
        return Err(Error::InvalidInput("language must not be empty".to_string()));
    }
    Ok(())
}

/// Record a downloaded (or uploaded / upgraded) subtitle, returning the history row id
pub async fn record_download(
    pool: &SqlitePool,
    hub: &EventHub,
    download: &SubtitleDownload,
) -> Result<i64> {
    require_language(&download.language)?;
    if download.origin != DownloadOrigin::Upload && download.provider.is_none() {
        return Err(Error::InvalidInput(
            "provider is required unless the subtitle was uploaded".to_string(),
        ));
    }

    let message = download_message(download);
    let entry = NewHistoryEntry {
        video_path: download.video_path.clone(),
        language: Some(download.language.clone()),
        provider: download.provider.clone(),
        score: download.score,
        subs_id: download.subs_id.clone(),
        subtitles_path: download.subtitles_path.clone(),
        ..NewHistoryEntry::new(download.origin.history_action(), download.target, message.clone())
    };

    let id = history_log(pool, hub, &entry).await?;
    info!("{} ({:?})", message, download.target);

    emit_item_refresh(hub, &download.target);
    hub.notify(Toast::new(message).severity(ToastSeverity::Success));
    Ok(id)
}

/// Record a subtitle file removed from disk, returning the history row id
pub async fn record_deletion(
    pool: &SqlitePool,
    hub: &EventHub,
    deletion: &SubtitleDeletion,
) -> Result<i64> {
    require_language(&deletion.language)?;

    let message = format!("{} subtitles deleted from disk.", deletion.language);
    let entry = NewHistoryEntry {
        video_path: deletion.video_path.clone(),
        language: Some(deletion.language.clone()),
        subtitles_path: deletion.subtitles_path.clone(),
        ..NewHistoryEntry::new(HistoryAction::Deleted, deletion.target, message.clone())
    };

    let id = history_log(pool, hub, &entry).await?;
    info!("{} ({:?})", message, deletion.target);

    emit_item_refresh(hub, &deletion.target);
    hub.show_message(message);
    Ok(id)
}

/// Record a subtitle re-synchronised against its video, returning the history row id
pub async fn record_sync(
    pool: &SqlitePool,
    hub: &EventHub,
    target: MediaTarget,
    language: &str,
    subtitles_path: Option<&str>,
) -> Result<i64> {
    require_language(language)?;

    let message = format!("{} subtitles synchronized.", language);
    let entry = NewHistoryEntry {
        language: Some(language.to_string()),
        subtitles_path: subtitles_path.map(str::to_string),
        ..NewHistoryEntry::new(HistoryAction::Synced, target, message.clone())
    };

    let id = history_log(pool, hub, &entry).await?;
    info!("{} ({:?})", message, target);

    emit_item_refresh(hub, &target);
    hub.show_message(message);
    Ok(id)
}
