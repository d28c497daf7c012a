//! Read-only keyword repository.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use aevis_core::{Error, Keyword, KeywordRepository, Result};

/// PostgreSQL implementation of [`KeywordRepository`].
#[derive(Clone)]
pub struct PgKeywordRepository {
    pool: Pool<Postgres>,
}

impl PgKeywordRepository {
    /// Create a new PgKeywordRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeywordRepository for PgKeywordRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Keyword>> {
        sqlx::query_as::<_, Keyword>(
            "SELECT id, project_id, owner_user_id, text FROM keywords WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn count_for_project(&self, project_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM keywords WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("count"))
    }
}
