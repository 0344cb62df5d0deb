//! # quire-db
//!
//! Storage layer for quire notebooks.
//!
//! This crate provides:
//! - Connection pool management
//! - The PostgreSQL [`TreeStore`] implementation
//! - The store-context factory (shared pool or pool per request)
//! - An in-memory store with the same ordering and cursor semantics
//!
//! ## Example
//!
//! ```rust,ignore
//! use quire_db::{Database, PgStoreProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quire").await?;
//!     let provider = PgStoreProvider::shared(db.pool().clone());
//!
//!     let lease = provider.acquire().await?;
//!     let total = lease.store().count_groups(notebook_id).await?;
//!     println!("{} groups", total);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod pool;
pub mod provider;
pub mod tree;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use quire_core::*;

pub use memory::{MemoryStoreProvider, MemoryTreeStore, StoreOp};
pub use pool::{close_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use provider::{PgStoreProvider, StoreContextMode};
pub use tree::PgTreeRepository;

/// Database context: the pool plus the tree repository over it.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Notebook tree reads.
    pub tree: PgTreeRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tree: PgTreeRepository::new(pool.clone()),
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

    /// Turn this database into a store provider for the given context mode.
    ///
    /// Per-request providers open their own pools, so this pool is closed.
    pub async fn into_store_provider(
        self,
        mode: StoreContextMode,
        database_url: &str,
    ) -> PgStoreProvider {
        let provider = PgStoreProvider::for_mode(mode, self.pool.clone(), database_url);
        if mode == StoreContextMode::PerRequest {
            close_pool(self.pool).await;
        }
        provider
    }
}
