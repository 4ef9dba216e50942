//! PostgreSQL implementation of the mapping store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use crate::domain::repositories::{InsertOutcome, LinkRepository};

/// PostgreSQL repository for short links.
///
/// Uniqueness is enforced by the primary key on `links.code`; the conditional
/// insert relies on `ON CONFLICT DO NOTHING`, so concurrent writers never need
/// a read-then-write check. Deletion sets `deleted_at` and keeps the row, which
/// retires the code for good.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO links (code, owner_id, target_url, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&link.code)
        .bind(link.owner_id)
        .bind(&link.target_url)
        .bind(link.created_at)
        .bind(link.expires_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Collision)
        }
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT code, owner_id, target_url, created_at, expires_at
            FROM links
            WHERE code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET deleted_at = NOW()
            WHERE code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn next_sequence(&self) -> Result<u64, StoreError> {
        let value: i64 = sqlx::query_scalar("SELECT nextval('link_code_seq')")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(value as u64)
    }

    async fn scan_active(&self) -> Result<Vec<ShortLink>, StoreError> {
        let links = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT code, owner_id, target_url, created_at, expires_at
            FROM links
            WHERE deleted_at IS NULL
            ORDER BY created_at, code
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ShortLink>, StoreError> {
        let links = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT code, owner_id, target_url, created_at, expires_at
            FROM links
            WHERE deleted_at IS NULL
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            ORDER BY expires_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
