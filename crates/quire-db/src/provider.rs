//! Store-context factory for PostgreSQL.
//!
//! A runtime flag picks between one long-lived pool shared by every request
//! and a fresh pool per request that is closed when the lease drops.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use quire_core::{Error, Result, StoreLease, StoreProvider, TreeStore};

use crate::pool::{close_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
use crate::tree::PgTreeRepository;

/// How store contexts are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreContextMode {
    /// One pool for the whole process.
    #[default]
    Shared,
    /// A new pool per request, closed on release.
    PerRequest,
}

impl StoreContextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreContextMode::Shared => "shared",
            StoreContextMode::PerRequest => "per_request",
        }
    }
}

impl FromStr for StoreContextMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(StoreContextMode::Shared),
            "per_request" | "per-request" => Ok(StoreContextMode::PerRequest),
            other => Err(Error::Config(format!(
                "unknown store context mode '{}' (expected 'shared' or 'per_request')",
                other
            ))),
        }
    }
}

enum ProviderInner {
    Shared {
        pool: PgPool,
        repo: Arc<PgTreeRepository>,
    },
    PerRequest {
        database_url: String,
        config: PoolConfig,
    },
}

/// PostgreSQL StoreProvider.
pub struct PgStoreProvider {
    inner: ProviderInner,
}

impl PgStoreProvider {
    /// Share one pool across all requests.
    pub fn shared(pool: PgPool) -> Self {
        Self {
            inner: ProviderInner::Shared {
                repo: Arc::new(PgTreeRepository::new(pool.clone())),
                pool,
            },
        }
    }

    /// Open a fresh pool for each request.
    pub fn per_request(database_url: impl Into<String>, config: PoolConfig) -> Self {
        Self {
            inner: ProviderInner::PerRequest {
                database_url: database_url.into(),
                config,
            },
        }
    }

    /// Provider for `mode`. `pool` backs the shared mode.
    pub fn for_mode(mode: StoreContextMode, pool: PgPool, database_url: &str) -> Self {
        match mode {
            StoreContextMode::Shared => Self::shared(pool),
            StoreContextMode::PerRequest => {
                Self::per_request(database_url, PoolConfig::per_request())
            }
        }
    }

    pub fn mode(&self) -> StoreContextMode {
        match self.inner {
            ProviderInner::Shared { .. } => StoreContextMode::Shared,
            ProviderInner::PerRequest { .. } => StoreContextMode::PerRequest,
        }
    }
}

#[async_trait]
impl StoreProvider for PgStoreProvider {
    async fn acquire(&self) -> Result<StoreLease> {
        match &self.inner {
            ProviderInner::Shared { pool, repo } => {
                log_pool_metrics(pool);
                let store: Arc<dyn TreeStore> = repo.clone();
                Ok(StoreLease::new(store))
            }
            ProviderInner::PerRequest {
                database_url,
                config,
            } => {
                let pool = create_pool_with_config(database_url, config.clone()).await?;
                let store: Arc<dyn TreeStore> = Arc::new(PgTreeRepository::new(pool.clone()));
                debug!(
                    subsystem = "database",
                    component = "store_provider",
                    op = "acquire",
                    "Per-request store context opened"
                );
                Ok(StoreLease::with_release(store, move || {
                    match tokio::runtime::Handle::try_current() {
                        Ok(handle) => {
                            handle.spawn(close_pool(pool));
                        }
                        Err(_) => warn!(
                            subsystem = "database",
                            component = "store_provider",
                            op = "release",
                            "No runtime available to close per-request pool"
                        ),
                    }
                }))
            }
        }
    }
}
