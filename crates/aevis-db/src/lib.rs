//! # aevis-db
//!
//! Storage layer for the AEVIS visibility pipeline.
//!
//! This crate provides:
//! - Connection pool management
//! - The append-only PostgreSQL observation store
//! - Read-only project/keyword repositories (records owned by the
//!   external CRUD collaborator)
//! - In-memory implementations for hermetic tests and demo mode
//!
//! ## Example
//!
//! ```rust,ignore
//! use aevis_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/aevis").await?;
//!     let keyword_count = db.keywords.count_for_project(project_id).await?;
//!     Ok(())
//! }
//! ```

pub mod keywords;
pub mod memory;
pub mod observations;
pub mod pool;
pub mod projects;

// Re-export core types
pub use aevis_core::*;

pub use keywords::PgKeywordRepository;
pub use memory::{
    MemoryDatabase, MemoryKeywordRepository, MemoryObservationStore, MemoryProjectRepository,
};
pub use observations::PgObservationStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use projects::PgProjectRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Append-only observation store.
    pub store: PgObservationStore,
    /// Read-only project repository.
    pub projects: PgProjectRepository,
    /// Read-only keyword repository.
    pub keywords: PgKeywordRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            store: PgObservationStore::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            keywords: PgKeywordRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
