//! PostgreSQL implementation of the ownership index.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::ShortLink;
use crate::domain::errors::StoreError;
use crate::domain::repositories::OwnershipIndex;

/// Ownership index stored in the `owner_links` table.
///
/// Insertion order is the `BIGSERIAL` id.
pub struct PgOwnershipIndex {
    pool: Arc<PgPool>,
}

impl PgOwnershipIndex {
    /// Creates a new index with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnershipIndex for PgOwnershipIndex {
    async fn append(&self, owner_id: Uuid, code: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO owner_links (owner_id, code)
            VALUES ($1, $2)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(owner_id)
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<String>, StoreError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT code
            FROM owner_links
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }

    async fn remove(&self, owner_id: Uuid, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM owner_links WHERE owner_id = $1 AND code = $2")
            .bind(owner_id)
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rebuild(&self, links: &[ShortLink]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM owner_links")
            .execute(&mut *tx)
            .await?;

        for link in links {
            sqlx::query("INSERT INTO owner_links (owner_id, code) VALUES ($1, $2)")
                .bind(link.owner_id)
                .bind(&link.code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
