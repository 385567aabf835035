//! Last-known-good profile snapshot for offline display.
//!
//! The snapshot is keyed separately from the session credential and carries no
//! expiry of its own; callers may pass a max age when loading.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::types::UserData;

const PROFILE_KEY: &str = "profile";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

/// A cached profile and when it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub profile: UserData,
    pub cached_at: DateTime<Utc>,
}

/// SQLite-backed snapshot store.
#[derive(Debug, Clone)]
pub struct ProfileSnapshotCache {
    pool: SqlitePool,
}

impl ProfileSnapshotCache {
    /// Open (creating if needed) the cache database at `path`.
    pub async fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Throwaway in-memory cache (tests, ephemeral sessions).
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single long-lived connection: every new in-memory connection would
        // see an empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, CacheError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                key        TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                cached_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Replace the snapshot with a freshly fetched profile.
    pub async fn store(&self, profile: &UserData) -> Result<(), CacheError> {
        self.store_at(profile, Utc::now()).await
    }

    pub async fn store_at(&self, profile: &UserData, cached_at: DateTime<Utc>) -> Result<(), CacheError> {
        let data = serde_json::to_string(profile).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (key, data, cached_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE
            SET data = excluded.data,
                cached_at = excluded.cached_at
            "#,
        )
        .bind(PROFILE_KEY)
        .bind(data)
        .bind(cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the snapshot, if any and not older than `max_age`.
    pub async fn load(&self, max_age: Option<chrono::Duration>) -> Result<Option<ProfileSnapshot>, CacheError> {
        let row = sqlx::query(
            r#"
            SELECT data, cached_at
            FROM snapshots
            WHERE key = ?1
            "#,
        )
        .bind(PROFILE_KEY)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: String = row.try_get("data")?;
        let cached_at: String = row.try_get("cached_at")?;
        let cached_at = DateTime::parse_from_rfc3339(&cached_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CacheError::Corrupt(format!("invalid cached_at: {e}")))?;

        if let Some(max) = max_age {
            if Utc::now().signed_duration_since(cached_at) > max {
                return Ok(None);
            }
        }

        let profile: UserData = serde_json::from_str(&data)
            .map_err(|e| CacheError::Corrupt(format!("invalid profile data: {e}")))?;

        Ok(Some(ProfileSnapshot { profile, cached_at }))
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?1")
            .bind(PROFILE_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Close the underlying pool, waiting for connections to shut down.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
