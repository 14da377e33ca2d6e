//! SQLite-based persistence store

use crate::core::SerializedPipeline;
use crate::persistence::{PipelineStore, SavedPipeline};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// SQLite pipeline store
pub struct SqlitePipelineStore {
    pool: SqlitePool,
}

impl SqlitePipelineStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// In-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self> {
        // One connection, so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pipelines (
                name TEXT PRIMARY KEY,
                pipeline TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn from_row(row: &SqliteRow) -> Result<SavedPipeline> {
        let name: String = row.get("name");
        let pipeline: SerializedPipeline = serde_json::from_str(&row.get::<String, _>("pipeline"))
            .with_context(|| format!("Corrupt saved pipeline '{}'", name))?;
        Ok(SavedPipeline {
            name,
            pipeline,
            saved_at: Self::from_naive(row.get("saved_at")),
        })
    }
}

#[async_trait::async_trait]
impl PipelineStore for SqlitePipelineStore {
    async fn save(&self, pipeline: &SavedPipeline) -> Result<()> {
        let json = serde_json::to_string(&pipeline.pipeline)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pipelines (name, pipeline, saved_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&pipeline.name)
        .bind(json)
        .bind(Self::to_naive(pipeline.saved_at))
        .execute(&self.pool)
        .await
        .context("Failed to save pipeline")?;

        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<SavedPipeline>> {
        let row = sqlx::query("SELECT name, pipeline, saved_at FROM pipelines WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load pipeline")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<SavedPipeline>> {
        let rows = sqlx::query("SELECT name, pipeline, saved_at FROM pipelines ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list pipelines")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pipelines WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to delete pipeline")?;

        Ok(result.rows_affected() > 0)
    }
}
