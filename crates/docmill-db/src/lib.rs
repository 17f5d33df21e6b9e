//! Database and blob-storage layer.
//!
//! Wraps a Postgres connection pool behind [`Database`], exposing the
//! document repository, and provides the filesystem-backed [`BlobStore`]
//! implementation used for uploaded and converted files.

pub mod documents;
pub mod pool;
pub mod storage;

pub use documents::PgDocumentRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use storage::{FilesystemStore, MemoryStore};

use sqlx::{Pool, Postgres};

use docmill_core::Result;

/// Shared database context.
///
/// Cheap to clone; the pool is internally reference-counted.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
    pub documents: PgDocumentRepository,
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        let documents = PgDocumentRepository::new(pool.clone());
        Self { pool, documents }
    }

    /// Connect with default pool settings.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with explicit pool settings.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| docmill_core::Error::Database(e.into()))?;
        Ok(())
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
