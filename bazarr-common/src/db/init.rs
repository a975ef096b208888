//! Database initialization
//!
//! Creates the database on first run and brings the schema up to date.
//! Every statement is idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a connection waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the SQLite database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas live on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets the SSE/websocket readers run alongside the single writer
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Each SQLite memory connection is its own database, hence the pool of one.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_blacklist_tables(pool).await?;
    create_history_tables(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    debug!("Database schema at version {}", SCHEMA_VERSION);
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Blacklisted (provider, subtitle id) pairs, one table per library
async fn create_blacklist_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_blacklist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sonarr_series_id INTEGER NOT NULL,
            sonarr_episode_id INTEGER NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            provider TEXT NOT NULL,
            subs_id TEXT NOT NULL,
            language TEXT,
            UNIQUE (provider, subs_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_blacklist_movie (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            radarr_id INTEGER NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            provider TEXT NOT NULL,
            subs_id TEXT NOT NULL,
            language TEXT,
            UNIQUE (provider, subs_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_history_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action INTEGER NOT NULL,
            sonarr_series_id INTEGER NOT NULL,
            sonarr_episode_id INTEGER NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            video_path TEXT,
            language TEXT,
            provider TEXT,
            score INTEGER,
            subs_id TEXT,
            subtitles_path TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_history_episode
         ON table_history (sonarr_series_id, sonarr_episode_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_history_movie (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action INTEGER NOT NULL,
            radarr_id INTEGER NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            video_path TEXT,
            language TEXT,
            provider TEXT,
            score INTEGER,
            subs_id TEXT,
            subtitles_path TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_history_movie ON table_history_movie (radarr_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
