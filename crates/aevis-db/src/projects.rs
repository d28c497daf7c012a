//! Read-only project repository.
//!
//! Project rows are written by the external CRUD collaborator; the
//! pipeline only ever reads them.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use aevis_core::{Error, Project, ProjectRepository, Result};

/// PostgreSQL implementation of [`ProjectRepository`].
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: Pool<Postgres>,
}

impl PgProjectRepository {
    /// Create a new PgProjectRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        sqlx::query_as::<_, Project>(
            "SELECT id, owner_user_id, name, domain, brand_name FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
