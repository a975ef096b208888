//! Subtitle blacklist
//!
//! A blacklisted (provider, subtitle id) pair is never selected again for the
//! library it was blacklisted in. Every mutation commits first and then emits
//! an `episode-blacklist` / `movie-blacklist` event so UI lists refresh.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::events::{EventAction, MediaKind, MediaTarget, UiEvent};
use crate::hub::EventHub;
use crate::pagination::{calculate_pagination, Page, PageRequest};
use crate::{Error, Result};

/// (provider, subtitle id)
pub type BlacklistKey = (String, String);

/// One blacklist row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlacklistEntry {
    pub id: i64,
    pub target: MediaTarget,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub subs_id: String,
    pub language: Option<String>,
}

fn validate_key(provider: &str, subs_id: &str) -> Result<()> {
    if provider.trim().is_empty() {
        return Err(Error::InvalidInput("provider must not be empty".to_string()));
    }
    if subs_id.trim().is_empty() {
        return Err(Error::InvalidInput("subs_id must not be empty".to_string()));
    }
    Ok(())
}

fn select_columns(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Episode => {
            "id, sonarr_series_id, sonarr_episode_id, timestamp, provider, subs_id, language"
        }
        MediaKind::Movie => "id, radarr_id, timestamp, provider, subs_id, language",
    }
}

fn entry_from_row(kind: MediaKind, row: &SqliteRow) -> std::result::Result<BlacklistEntry, sqlx::Error> {
    let target = match kind {
        MediaKind::Episode => MediaTarget::Episode {
            series_id: row.try_get("sonarr_series_id")?,
            episode_id: row.try_get("sonarr_episode_id")?,
        },
        MediaKind::Movie => MediaTarget::Movie {
            movie_id: row.try_get("radarr_id")?,
        },
    };

    Ok(BlacklistEntry {
        id: row.try_get("id")?,
        target,
        timestamp: row.try_get("timestamp")?,
        provider: row.try_get("provider")?,
        subs_id: row.try_get("subs_id")?,
        language: row.try_get("language")?,
    })
}

/// Blacklist a subtitle for `target`
///
/// Blacklisting a pair that is already present refreshes its timestamp,
/// language and owning item instead of failing.
pub async fn blacklist_log(
    pool: &SqlitePool,
    hub: &EventHub,
    target: MediaTarget,
    provider: &str,
    subs_id: &str,
    language: Option<&str>,
) -> Result<()> {
    validate_key(provider, subs_id)?;
    let now = Utc::now();

    match target {
        MediaTarget::Episode {
            series_id,
            episode_id,
        } => {
            sqlx::query(
                r#"
                INSERT INTO table_blacklist
                    (sonarr_series_id, sonarr_episode_id, timestamp, provider, subs_id, language)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (provider, subs_id) DO UPDATE SET
                    sonarr_series_id = excluded.sonarr_series_id,
                    sonarr_episode_id = excluded.sonarr_episode_id,
                    timestamp = excluded.timestamp,
                    language = excluded.language
                "#,
            )
            .bind(series_id)
            .bind(episode_id)
            .bind(now)
            .bind(provider)
            .bind(subs_id)
            .bind(language)
            .execute(pool)
            .await?;
        }
        MediaTarget::Movie { movie_id } => {
            sqlx::query(
                r#"
                INSERT INTO table_blacklist_movie
                    (radarr_id, timestamp, provider, subs_id, language)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (provider, subs_id) DO UPDATE SET
                    radarr_id = excluded.radarr_id,
                    timestamp = excluded.timestamp,
                    language = excluded.language
                "#,
            )
            .bind(movie_id)
            .bind(now)
            .bind(provider)
            .bind(subs_id)
            .bind(language)
            .execute(pool)
            .await?;
        }
    }

    info!(
        "Blacklisted {} subtitle {} from {} ({:?})",
        target.kind(),
        subs_id,
        provider,
        target
    );
    hub.emit(UiEvent::for_target(target.kind().blacklist_event(), &target));
    Ok(())
}

/// Remove one pair from the blacklist
///
/// Returns `false` (and emits nothing) when the pair was not blacklisted.
pub async fn blacklist_delete(
    pool: &SqlitePool,
    hub: &EventHub,
    kind: MediaKind,
    provider: &str,
    subs_id: &str,
) -> Result<bool> {
    validate_key(provider, subs_id)?;
    let table = kind.blacklist_table();

    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        "SELECT {} FROM {} WHERE provider = ? AND subs_id = ?",
        select_columns(kind),
        table
    ))
    .bind(provider)
    .bind(subs_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        debug!("{} subtitle {} from {} not blacklisted", kind, subs_id, provider);
        return Ok(false);
    };
    let entry = entry_from_row(kind, &row)?;

    sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Removed {} subtitle {} from {} from blacklist", kind, subs_id, provider);
    hub.emit(
        UiEvent::for_target(kind.blacklist_event(), &entry.target).action(EventAction::Delete),
    );
    Ok(true)
}

/// Clear the whole blacklist of one library, returning the number of rows removed
pub async fn blacklist_delete_all(pool: &SqlitePool, hub: &EventHub, kind: MediaKind) -> Result<u64> {
    let result = sqlx::query(&format!("DELETE FROM {}", kind.blacklist_table()))
        .execute(pool)
        .await?;
    let removed = result.rows_affected();

    info!("Cleared {} blacklist ({} entries)", kind, removed);
    hub.emit(UiEvent::new(kind.blacklist_event()).action(EventAction::Delete));
    Ok(removed)
}

/// All blacklisted pairs of one library, for excluding candidates
pub async fn get_blacklist(pool: &SqlitePool, kind: MediaKind) -> Result<HashSet<BlacklistKey>> {
    let rows: Vec<(String, String)> = sqlx::query_as(&format!(
        "SELECT provider, subs_id FROM {}",
        kind.blacklist_table()
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

pub async fn is_blacklisted(
    pool: &SqlitePool,
    kind: MediaKind,
    provider: &str,
    subs_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE provider = ? AND subs_id = ?)",
        kind.blacklist_table()
    ))
    .bind(provider)
    .bind(subs_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Blacklist rows of one library, newest first
pub async fn list_blacklist(
    pool: &SqlitePool,
    kind: MediaKind,
    request: PageRequest,
) -> Result<Page<BlacklistEntry>> {
    let table = kind.blacklist_table();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    let p = calculate_pagination(total, request);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM {} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        select_columns(kind),
        table
    ))
    .bind(p.page_size)
    .bind(p.offset)
    .fetch_all(pool)
    .await?;

    let items = rows
        .iter()
        .map(|row| entry_from_row(kind, row))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: p.page,
        page_size: p.page_size,
        total_pages: p.total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::events::EventType;

    fn episode(series_id: i64, episode_id: i64) -> MediaTarget {
        MediaTarget::Episode {
            series_id,
            episode_id,
        }
    }

    #[tokio::test]
    async fn test_log_persists_and_emits() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();
        let mut ws = hub.subscribe();

        blacklist_log(&pool, &hub, episode(1, 10), "opensubtitles", "abc", Some("en"))
            .await
            .expect("blacklist_log");

        assert!(is_blacklisted(&pool, MediaKind::Episode, "opensubtitles", "abc")
            .await
            .expect("is_blacklisted"));
        assert!(!is_blacklisted(&pool, MediaKind::Movie, "opensubtitles", "abc")
            .await
            .expect("is_blacklisted"));

        let event = hub.try_next_event().expect("sse event");
        assert_eq!(event.event_type, EventType::EpisodeBlacklist);
        assert_eq!(event.action, EventAction::Update);
        assert_eq!(event.series, Some(1));
        assert_eq!(event.episode, Some(10));

        let event = ws.try_recv().expect("websocket event");
        assert_eq!(event.event_type, EventType::EpisodeBlacklist);
    }

    #[tokio::test]
    async fn test_log_twice_refreshes_row() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        blacklist_log(&pool, &hub, MediaTarget::Movie { movie_id: 5 }, "podnapisi", "x1", Some("fr"))
            .await
            .expect("first log");
        blacklist_log(&pool, &hub, MediaTarget::Movie { movie_id: 5 }, "podnapisi", "x1", Some("de"))
            .await
            .expect("second log");

        let page = list_blacklist(&pool, MediaKind::Movie, PageRequest::default())
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].language.as_deref(), Some("de"));
        assert_eq!(page.items[0].target, MediaTarget::Movie { movie_id: 5 });
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_event() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        let result = blacklist_log(&pool, &hub, episode(1, 1), "", "abc", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = blacklist_log(&pool, &hub, episode(1, 1), "provider", "  ", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        assert!(hub.try_next_event().is_none());
    }

    #[tokio::test]
    async fn test_delete_emits_with_target_ids() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        blacklist_log(&pool, &hub, episode(2, 20), "addic7ed", "s1", None)
            .await
            .expect("log");
        hub.try_next_event();

        let removed = blacklist_delete(&pool, &hub, MediaKind::Episode, "addic7ed", "s1")
            .await
            .expect("delete");
        assert!(removed);

        let event = hub.try_next_event().expect("delete event");
        assert_eq!(event.action, EventAction::Delete);
        assert_eq!(event.series, Some(2));
        assert_eq!(event.episode, Some(20));

        assert!(get_blacklist(&pool, MediaKind::Episode)
            .await
            .expect("get")
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_silent() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        let removed = blacklist_delete(&pool, &hub, MediaKind::Movie, "addic7ed", "nope")
            .await
            .expect("delete");
        assert!(!removed);
        assert!(hub.try_next_event().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_only_touches_one_library() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        blacklist_log(&pool, &hub, episode(1, 1), "p", "a", None).await.expect("log");
        blacklist_log(&pool, &hub, episode(1, 2), "p", "b", None).await.expect("log");
        blacklist_log(&pool, &hub, MediaTarget::Movie { movie_id: 3 }, "p", "a", None)
            .await
            .expect("log");
        while hub.try_next_event().is_some() {}

        let removed = blacklist_delete_all(&pool, &hub, MediaKind::Episode)
            .await
            .expect("delete all");
        assert_eq!(removed, 2);

        let event = hub.try_next_event().expect("delete-all event");
        assert_eq!(event.event_type, EventType::EpisodeBlacklist);
        assert_eq!(event.action, EventAction::Delete);
        assert_eq!(event.series, None);

        let movies = get_blacklist(&pool, MediaKind::Movie).await.expect("get");
        assert!(movies.contains(&("p".to_string(), "a".to_string())));
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let pool = init_memory_database().await.expect("memory db");
        let hub = EventHub::default();

        for i in 0..5 {
            blacklist_log(&pool, &hub, episode(1, i), "p", &format!("sub{}", i), None)
                .await
                .expect("log");
        }

        let page = list_blacklist(&pool, MediaKind::Episode, PageRequest::new(1, 2))
            .await
            .expect("list");
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].subs_id, "sub4");

        let last = list_blacklist(&pool, MediaKind::Episode, PageRequest::new(3, 2))
            .await
            .expect("list");
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].subs_id, "sub0");
    }
}
