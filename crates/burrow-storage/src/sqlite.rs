use crate::sql::{decode_code, map_sqlx_error, upsert_outcome};
use async_trait::async_trait;
use burrow_core::repository::{Repository, Result};
use burrow_core::{OriginalUrl, ShortCode, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, trace};

const SCHEMA: &str = include_str!("../ddl/sqlite/links.sql");

/// SQLite implementation of the repository contract.
///
/// Same schema and upsert as [`PostgresRepository`](crate::PostgresRepository),
/// for single-node deployments and tests.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url` (e.g. `sqlite://burrow.db`), creating
    /// the database file if it does not exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(map_sqlx_error)?;
        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Creates the `links` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("SQLite schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode> {
        let outcome = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO links (original_link, shortened_link)
            VALUES (?, ?)
            ON CONFLICT (original_link)
            DO UPDATE SET shortened_link = links.shortened_link
            RETURNING shortened_link
            "#,
        )
        .bind(original.as_str())
        .bind(candidate.as_str())
        .fetch_one(&self.pool)
        .await;

        let stored = upsert_outcome(outcome, candidate)?;
        trace!(code = %stored, candidate = %candidate, "Upserted mapping in SQLite");
        Ok(stored)
    }

    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_link
            FROM links
            WHERE shortened_link = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .map(OriginalUrl::new_unchecked)
        .ok_or_else(|| StorageError::OriginalNotFound(code.clone()))
    }

    async fn get_shortened_by_original(&self, original: &OriginalUrl) -> Result<ShortCode> {
        let raw = sqlx::query_scalar::<_, String>(
            r#"
            SELECT shortened_link
            FROM links
            WHERE original_link = ?
            "#,
        )
        .bind(original.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| StorageError::ShortenedNotFound(original.clone()))?;

        decode_code(raw)
    }
}
