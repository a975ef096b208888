//! Subtitle history log
//!
//! Each subtitle action (download, upgrade, upload, sync, deletion, ...) is
//! appended to the episode or movie history table. After the insert commits
//! an `episode-history` / `movie-history` event is emitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;

use crate::events::{MediaKind, MediaTarget, UiEvent};
use crate::hub::EventHub;
use crate::pagination::{calculate_pagination, Page, PageRequest};
use crate::Result;

/// History action codes as stored in the `action` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Deleted = 0,
    Downloaded = 1,
    ManuallyDownloaded = 2,
    Upgraded = 3,
    Uploaded = 4,
    Synced = 5,
    Translated = 6,
}

impl HistoryAction {
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for HistoryAction {
    type Error = String;

    fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(HistoryAction::Deleted),
            1 => Ok(HistoryAction::Downloaded),
            2 => Ok(HistoryAction::ManuallyDownloaded),
            3 => Ok(HistoryAction::Upgraded),
            4 => Ok(HistoryAction::Uploaded),
            5 => Ok(HistoryAction::Synced),
            6 => Ok(HistoryAction::Translated),
            other => Err(format!("unknown history action code {}", other)),
        }
    }
}

/// History row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub action: HistoryAction,
    pub target: MediaTarget,
    pub description: String,
    pub video_path: Option<String>,
    pub language: Option<String>,
    pub provider: Option<String>,
    pub score: Option<i64>,
    pub subs_id: Option<String>,
    pub subtitles_path: Option<String>,
}

impl NewHistoryEntry {
    pub fn new(action: HistoryAction, target: MediaTarget, description: impl Into<String>) -> Self {
        Self {
            action,
            target,
            description: description.into(),
            video_path: None,
            language: None,
            provider: None,
            score: None,
            subs_id: None,
            subtitles_path: None,
        }
    }
}

/// Stored history row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub action: HistoryAction,
    pub target: MediaTarget,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub video_path: Option<String>,
    pub language: Option<String>,
    pub provider: Option<String>,
    pub score: Option<i64>,
    pub subs_id: Option<String>,
    pub subtitles_path: Option<String>,
}

/// Optional filters for `list_history`
///
/// `series_id` / `episode_id` only apply to episode history and `movie_id`
/// only to movie history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub series_id: Option<i64>,
    pub episode_id: Option<i64>,
    pub movie_id: Option<i64>,
    pub action: Option<HistoryAction>,
}

const EPISODE_COLUMNS: &str = "id, action, sonarr_series_id, sonarr_episode_id, timestamp, \
     description, video_path, language, provider, score, subs_id, subtitles_path";

const MOVIE_COLUMNS: &str = "id, action, radarr_id, timestamp, \
     description, video_path, language, provider, score, subs_id, subtitles_path";

fn record_from_row(kind: MediaKind, row: &SqliteRow) -> std::result::Result<HistoryRecord, sqlx::Error> {
    let target = match kind {
        MediaKind::Episode => MediaTarget::Episode {
            series_id: row.try_get("sonarr_series_id")?,
            episode_id: row.try_get("sonarr_episode_id")?,
        },
        MediaKind::Movie => MediaTarget::Movie {
            movie_id: row.try_get("radarr_id")?,
        },
    };

    let code: i64 = row.try_get("action")?;
    let action = HistoryAction::try_from(code).map_err(|e| sqlx::Error::ColumnDecode {
        index: "action".to_string(),
        source: e.into(),
    })?;

    Ok(HistoryRecord {
        id: row.try_get("id")?,
        action,
        target,
        timestamp: row.try_get("timestamp")?,
        description: row.try_get("description")?,
        video_path: row.try_get("video_path")?,
        language: row.try_get("language")?,
        provider: row.try_get("provider")?,
        score: row.try_get("score")?,
        subs_id: row.try_get("subs_id")?,
        subtitles_path: row.try_get("subtitles_path")?,
    })
}

/// Append a history row and notify clients, returning the new row id
pub async fn history_log(pool: &SqlitePool, hub: &EventHub, entry: &NewHistoryEntry) -> Result<i64> {
    let now = Utc::now();

    let result = match entry.target {
        MediaTarget::Episode {
            series_id,
            episode_id,
        } => {
            sqlx::query(
                r#"
                INSERT INTO table_history
                    (action, sonarr_series_id, sonarr_episode_id, timestamp, description,
                     video_path, language, provider, score, subs_id, subtitles_path)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.action.code())
            .bind(series_id)
            .bind(episode_id)
            .bind(now)
            .bind(&entry.description)
            .bind(&entry.video_path)
            .bind(&entry.language)
            .bind(&entry.provider)
            .bind(entry.score)
            .bind(&entry.subs_id)
            .bind(&entry.subtitles_path)
            .execute(pool)
            .await?
        }
        MediaTarget::Movie { movie_id } => {
            sqlx::query(
                r#"
                INSERT INTO table_history_movie
                    (action, radarr_id, timestamp, description,
                     video_path, language, provider, score, subs_id, subtitles_path)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.action.code())
            .bind(movie_id)
            .bind(now)
            .bind(&entry.description)
            .bind(&entry.video_path)
            .bind(&entry.language)
            .bind(&entry.provider)
            .bind(entry.score)
            .bind(&entry.subs_id)
            .bind(&entry.subtitles_path)
            .execute(pool)
            .await?
        }
    };

    let id = result.last_insert_rowid();
    info!(
        "History {:?} for {:?}: {}",
        entry.action, entry.target, entry.description
    );

    hub.emit(UiEvent::for_target(entry.target.kind().history_event(), &entry.target));
    Ok(id)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, kind: MediaKind, filter: &HistoryFilter) {
    builder.push(" WHERE 1 = 1");

    match kind {
        MediaKind::Episode => {
            if let Some(series_id) = filter.series_id {
                builder.push(" AND sonarr_series_id = ").push_bind(series_id);
            }
            if let Some(episode_id) = filter.episode_id {
                builder.push(" AND sonarr_episode_id = ").push_bind(episode_id);
            }
        }
        MediaKind::Movie => {
            if let Some(movie_id) = filter.movie_id {
                builder.push(" AND radarr_id = ").push_bind(movie_id);
            }
        }
    }

    if let Some(action) = filter.action {
        builder.push(" AND action = ").push_bind(action.code());
    }
}

/// History rows of one library, newest first
pub async fn list_history(
    pool: &SqlitePool,
    kind: MediaKind,
    filter: &HistoryFilter,
    request: PageRequest,
) -> Result<Page<HistoryRecord>> {
    let table = kind.history_table();

    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", table));
    push_filters(&mut count, kind, filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let p = calculate_pagination(total, request);

    let columns = match kind {
        MediaKind::Episode => EPISODE_COLUMNS,
        MediaKind::Movie => MOVIE_COLUMNS,
    };
    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", columns, table));
    push_filters(&mut select, kind, filter);
    select
        .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
        .push_bind(p.page_size)
        .push(" OFFSET ")
        .push_bind(p.offset);

    let rows = select.build().fetch_all(pool).await?;
    let items = rows
        .iter()
        .map(|row| record_from_row(kind, row))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: p.page,
        page_size: p.page_size,
        total_pages: p.total_pages,
    })
}

pub async fn history_count(pool: &SqlitePool, kind: MediaKind) -> Result<i64> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", kind.history_table()))
        .fetch_one(pool)
        .await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::events::{EventAction, EventType};
    use crate::Error;

    fn download(target: MediaTarget, score: i64) -> NewHistoryEntry {
        NewHistoryEntry {
            video_path: Some("/tv/show/s01e01.mkv".to_string()),
            language: Some("en".to_string()),
            provider: Some("opensubtitles".to_string()),
            score: Some(score),
            subs_id: Some(format!("sub-{}", score)),
            subtitles_path: Some("/tv/show/s01e01.en.srt".to_string()),
            ..NewHistoryEntry::new(HistoryAction::Downloaded, target, "English subtitles downloaded")
        }
    }

    #[test]
    fn test_action_codes_roundtrip() {
        for code in 0..=6 {
            let action = HistoryAction::try_from(code).expect("known code");
            assert_eq!(action.code(), code);
        }
        assert!(HistoryAction::try_from(42).is_err());
    }

    #[tokio::test]
    async fn test_history_log_emits_history_event() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();
        let target = MediaTarget::Episode {
            series_id: 7,
            episode_id: 70,
        };

        let id = history_log(&pool, &hub, &download(target, 90)).await.expect("history_log");
        assert!(id > 0);

        let event = hub.try_next_event().expect("history event");
        assert_eq!(event.event_type, EventType::EpisodeHistory);
        assert_eq!(event.action, EventAction::Update);
        assert_eq!(event.series, Some(7));
        assert_eq!(event.episode, Some(70));

        assert_eq!(history_count(&pool, MediaKind::Episode).await.expect("count"), 1);
        assert_eq!(history_count(&pool, MediaKind::Movie).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_list_history_filters() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        let ep1 = MediaTarget::Episode {
            series_id: 1,
            episode_id: 1,
        };
        let ep2 = MediaTarget::Episode {
            series_id: 1,
            episode_id: 2,
        };
        history_log(&pool, &hub, &download(ep1, 80)).await.expect("log");
        history_log(&pool, &hub, &download(ep2, 85)).await.expect("log");
        history_log(
            &pool,
            &hub,
            &NewHistoryEntry::new(HistoryAction::Deleted, ep2, "Subtitle file deleted"),
        )
        .await
        .expect("log");

        let all = list_history(&pool, MediaKind::Episode, &HistoryFilter::default(), PageRequest::default())
            .await
            .expect("list");
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].action, HistoryAction::Deleted);

        let filter = HistoryFilter {
            episode_id: Some(2),
            ..Default::default()
        };
        let ep2_rows = list_history(&pool, MediaKind::Episode, &filter, PageRequest::default())
            .await
            .expect("list");
        assert_eq!(ep2_rows.total, 2);

        let filter = HistoryFilter {
            series_id: Some(1),
            action: Some(HistoryAction::Downloaded),
            ..Default::default()
        };
        let downloads = list_history(&pool, MediaKind::Episode, &filter, PageRequest::default())
            .await
            .expect("list");
        assert_eq!(downloads.total, 2);
        assert!(downloads.items.iter().all(|r| r.action == HistoryAction::Downloaded));
    }

    #[tokio::test]
    async fn test_movie_history_roundtrip_fields() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();
        let target = MediaTarget::Movie { movie_id: 12 };

        history_log(&pool, &hub, &download(target, 117)).await.expect("log");

        let filter = HistoryFilter {
            movie_id: Some(12),
            ..Default::default()
        };
        let page = list_history(&pool, MediaKind::Movie, &filter, PageRequest::default())
            .await
            .expect("list");

        let record = &page.items[0];
        assert_eq!(record.target, target);
        assert_eq!(record.score, Some(117));
        assert_eq!(record.provider.as_deref(), Some("opensubtitles"));
        assert_eq!(record.subs_id.as_deref(), Some("sub-117"));

        let event = hub.try_next_event().expect("movie history event");
        assert_eq!(event.event_type, EventType::MovieHistory);
        assert_eq!(event.movie, Some(12));
    }

    #[tokio::test]
    async fn test_unknown_action_code_is_decode_error() {
        let pool = init_memory_database().await.expect("memory db");

        sqlx::query(
            "INSERT INTO table_history_movie (action, radarr_id, timestamp, description)
             VALUES (99, 1, ?, 'bogus')",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .expect("raw insert");

        let result = list_history(&pool, MediaKind::Movie, &HistoryFilter::default(), PageRequest::default()).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
