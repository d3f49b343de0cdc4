//! Cached remote query results.
//!
//! Holds the last fetched [`RemoteCartSnapshot`] so every cart-consuming
//! view does not refetch it, and so optimistic mutations can edit what the
//! view shows before the server answers. Entries expire after the
//! configured TTL.

use std::time::Duration;

use foody_core::RemoteCartSnapshot;
use moka::future::Cache;
use tracing::debug;

/// Cache key for remote queries.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Cart,
}

/// Query cache for the remote cart.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<CacheKey, RemoteCartSnapshot>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { cache }
    }

    /// The cached cart snapshot, if fresh.
    pub async fn cart(&self) -> Option<RemoteCartSnapshot> {
        let hit = self.cache.get(&CacheKey::Cart).await;
        debug!(hit = hit.is_some(), "Cart cache lookup");
        hit
    }

    /// Store a cart snapshot.
    pub async fn put_cart(&self, snapshot: RemoteCartSnapshot) {
        self.cache.insert(CacheKey::Cart, snapshot).await;
    }

    /// Edit the cached snapshot in place.
    ///
    /// Returns the snapshot as it was before the edit so the caller can
    /// restore it. Does nothing when no snapshot is cached.
    pub async fn update_cart(
        &self,
        edit: impl FnOnce(&RemoteCartSnapshot) -> RemoteCartSnapshot,
    ) -> Option<RemoteCartSnapshot> {
        let previous = self.cache.get(&CacheKey::Cart).await?;
        self.cache.insert(CacheKey::Cart, edit(&previous)).await;
        Some(previous)
    }

    /// Put back a snapshot captured before an optimistic edit, or drop the
    /// entry if there was none.
    pub async fn restore_cart(&self, previous: Option<RemoteCartSnapshot>) {
        match previous {
            Some(snapshot) => self.put_cart(snapshot).await,
            None => self.invalidate_cart().await,
        }
    }

    /// Drop the cached snapshot so the next read refetches.
    pub async fn invalidate_cart(&self) {
        self.cache.invalidate(&CacheKey::Cart).await;
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
