use crate::sql::{decode_code, map_sqlx_error, upsert_outcome};
use async_trait::async_trait;
use burrow_core::repository::{Repository, Result};
use burrow_core::{OriginalUrl, ShortCode, StorageError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, trace};

const SCHEMA: &str = include_str!("../ddl/postgres/links.sql");

/// PostgreSQL implementation of the repository contract.
///
/// Mappings live in a single `links` table with unique constraints on both
/// columns. Get-or-create is one `INSERT ... ON CONFLICT (original_link)`
/// statement, so racing writers for the same original all read back the row
/// that won.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing PostgreSQL connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new PostgreSQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `links` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("PostgreSQL schema is up to date");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode> {
        let outcome = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO links (original_link, shortened_link)
            VALUES ($1, $2)
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
        trace!(code = %stored, candidate = %candidate, "Upserted mapping in PostgreSQL");
        Ok(stored)
    }

    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_link
            FROM links
            WHERE shortened_link = $1
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
            WHERE original_link = $1
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
