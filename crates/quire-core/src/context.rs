//! Store context acquisition.
//!
//! Each request acquires a [`StoreLease`] from a [`StoreProvider`] and drops
//! it when done. Dropping runs the provider's release hook exactly once,
//! whichever way the request ends. Whether the provider hands out a
//! long-lived shared store or a fresh one per request is invisible to
//! callers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::TreeStore;

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// Scoped handle on a store; releases on drop.
pub struct StoreLease {
    store: Arc<dyn TreeStore>,
    release: Option<ReleaseHook>,
}

impl StoreLease {
    /// Lease over a store that needs no release step.
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self {
            store,
            release: None,
        }
    }

    /// Lease whose `release` hook runs when the lease is dropped.
    pub fn with_release<F>(store: Arc<dyn TreeStore>, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            store,
            release: Some(Box::new(release)),
        }
    }

    /// The leased store.
    pub fn store(&self) -> &dyn TreeStore {
        self.store.as_ref()
    }
}

impl Drop for StoreLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for StoreLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLease")
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

/// Factory for per-request store leases.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    /// Acquire a store for the duration of one request.
    async fn acquire(&self) -> Result<StoreLease>;
}
