use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::EntryKind;

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Host-side persistence for saved lists and the refresh interval.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRefreshSettings {
    pub interval_ms: u64,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to `sqlite::memory:` opens a fresh database, so the
        // in-memory pool is pinned to one connection that never expires.
        let pool_options = if database_url == IN_MEMORY_URL {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run storage migrations")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Replaces the stored list for `kind` with `entries`, keeping their order.
    pub async fn replace_entries(&self, kind: EntryKind, entries: &[String]) -> Result<()> {
        let list_kind = list_kind_key(kind);
        let mut tx = self.pool.begin().await.context("begin replace_entries")?;

        sqlx::query("DELETE FROM saved_entries WHERE list_kind = ?")
            .bind(list_kind)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to clear saved {list_kind}"))?;

        for (position, value) in entries.iter().enumerate() {
            sqlx::query("INSERT INTO saved_entries (list_kind, position, value) VALUES (?, ?, ?)")
                .bind(list_kind)
                .bind(position as i64)
                .bind(value)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to insert {list_kind} entry #{position}"))?;
        }

        tx.commit().await.context("commit replace_entries")?;
        Ok(())
    }

    pub async fn load_entries(&self, kind: EntryKind) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT value FROM saved_entries WHERE list_kind = ? ORDER BY position ASC",
        )
        .bind(list_kind_key(kind))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load saved {}", list_kind_key(kind)))?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("value").map_err(Into::into))
            .collect()
    }

    pub async fn save_refresh_interval(&self, interval_ms: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_settings (id, interval_ms, updated_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                interval_ms = excluded.interval_ms,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(interval_ms as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to save refresh interval")?;
        Ok(())
    }

    pub async fn load_refresh_settings(&self) -> Result<Option<StoredRefreshSettings>> {
        let row = sqlx::query("SELECT interval_ms, updated_at FROM refresh_settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to load refresh settings")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let interval_ms: i64 = row.try_get("interval_ms")?;
        Ok(Some(StoredRefreshSettings {
            interval_ms: u64::try_from(interval_ms)
                .context("stored refresh interval is negative")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

fn list_kind_key(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Products => "products",
        EntryKind::Keywords => "keywords",
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == IN_MEMORY_URL || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
