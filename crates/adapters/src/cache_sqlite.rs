//! SQLite file cache
//!
//! A single-host alternative to Redis: entries live in a key-value table so
//! separate processes sharing the file see each other's writes. Expiry is
//! wall-clock milliseconds, checked on read.

use async_trait::async_trait;
use birdfeed_domain::{Cache, CacheError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use time::OffsetDateTime;

/// Cache backed by a SQLite file
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Transport(format!("Failed to create directory: {}", e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(transport)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(transport)?;

        Ok(Self { pool })
    }

    /// Number of stored keys, expired ones included until touched
    pub async fn len(&self) -> Result<u64, CacheError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(transport)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let row: Option<(String, Option<i64>)> =
            sqlx::query_as("SELECT value, expires_at FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(transport)?;

        match row {
            Some((value, None)) => Ok(value),
            Some((value, Some(expires_at))) if now_millis() < expires_at => Ok(value),
            Some((_, Some(expires_at))) => {
                sqlx::query("DELETE FROM cache_entries WHERE key = ? AND expires_at = ?")
                    .bind(key)
                    .bind(expires_at)
                    .execute(&self.pool)
                    .await
                    .map_err(transport)?;
                Err(CacheError::NotFound(key.to_string()))
            }
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| now_millis().saturating_add(ttl.as_millis() as i64));

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(transport)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(transport)?;
        Ok(())
    }
}

fn transport(e: sqlx::Error) -> CacheError {
    CacheError::Transport(e.to_string())
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
