//! Deadline decorators for store and cache ports
//!
//! Every call is bounded by `tokio::time::timeout`; an elapsed deadline
//! surfaces as the port's `Timeout` error so callers treat it like any
//! other failure of that dependency.

use async_trait::async_trait;
use birdfeed_domain::{
    Cache, CacheError, Collection, Document, DocumentStore, Filter, FindOptions, StoreError,
    Update,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default deadline for a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default deadline for a single cache call
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Wraps a document store with a per-call deadline
pub struct TimeoutStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        collection: Collection,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, %collection, limit = ?self.limit, "Store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for TimeoutStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        self.bounded("insert", collection, self.inner.insert(collection, document))
            .await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.bounded("find_one", collection, self.inner.find_one(collection, filter))
            .await
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.bounded(
            "find_many",
            collection,
            self.inner.find_many(collection, filter, options),
        )
        .await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError> {
        self.bounded(
            "update_one",
            collection,
            self.inner.update_one(collection, filter, update),
        )
        .await
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, StoreError> {
        self.bounded("delete_one", collection, self.inner.delete_one(collection, filter))
            .await
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        self.bounded("count", collection, self.inner.count(collection, filter))
            .await
    }
}

/// Wraps a cache with a per-call deadline
pub struct TimeoutCache {
    inner: Arc<dyn Cache>,
    limit: Duration,
}

impl TimeoutCache {
    pub fn new(inner: Arc<dyn Cache>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, CacheError>> + Send,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.limit, fut).await.unwrap_or_else(|_| {
            tracing::debug!(op, limit = ?self.limit, "Cache call timed out");
            Err(CacheError::Timeout(self.limit))
        })
    }
}

#[async_trait]
impl Cache for TimeoutCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.bounded("set", self.inner.set(key, value, ttl)).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.bounded("delete", self.inner.delete(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::store::InMemoryDocumentStore;

    /// Store whose reads never complete
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn insert(&self, _: Collection, _: Document) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn find_one(&self, _: Collection, _: &Filter) -> Result<Option<Document>, StoreError> {
            std::future::pending().await
        }

        async fn find_many(
            &self,
            _: Collection,
            _: &Filter,
            _: &FindOptions,
        ) -> Result<Vec<Document>, StoreError> {
            std::future::pending().await
        }

        async fn update_one(&self, _: Collection, _: &Filter, _: &Update) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn delete_one(&self, _: Collection, _: &Filter) -> Result<bool, StoreError> {
            std::future::pending().await
        }

        async fn count(&self, _: Collection, _: &Filter) -> Result<u64, StoreError> {
            std::future::pending().await
        }
    }

    struct StalledCache;

    #[async_trait]
    impl Cache for StalledCache {
        async fn get(&self, _: &str) -> Result<String, CacheError> {
            std::future::pending().await
        }

        async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), CacheError> {
            std::future::pending().await
        }

        async fn delete(&self, _: &str) -> Result<(), CacheError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let store = TimeoutStore::new(Arc::new(StalledStore), Duration::from_millis(50));
        let result = store.find_one(Collection::Users, &Filter::new()).await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_cache_times_out() {
        let cache = TimeoutCache::new(Arc::new(StalledCache), DEFAULT_CACHE_TIMEOUT);
        assert!(matches!(cache.get("k").await, Err(CacheError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let store = TimeoutStore::new(Arc::new(InMemoryDocumentStore::new()), DEFAULT_STORE_TIMEOUT);
        store.insert(Collection::Users, Document::new()).await.unwrap();
        assert_eq!(store.count(Collection::Users, &Filter::new()).await.unwrap(), 1);

        let cache = TimeoutCache::new(Arc::new(InMemoryCache::new()), DEFAULT_CACHE_TIMEOUT);
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), "v");
    }
}
