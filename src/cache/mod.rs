// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fail-open cache-aside layer.
//!
//! The cache is an optimization, never a dependency: every operation
//! swallows backend errors and degrades to a miss (reads) or a no-op
//! (writes). Backend calls go through a circuit breaker so a dead Redis
//! stops costing a timeout per read.
//!
//! ```text
//!   get(key) ──► store attached? ──no──► miss
//!                      │yes
//!                      ▼
//!              circuit breaker ──open──► miss
//!                      │
//!                      ▼
//!               CacheStore::get ──err──► miss (warn)
//! ```

pub mod key;

pub use key::cache_key;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitConfig, CircuitError};
use crate::storage::{CacheStore, RedisCacheStore, StorageError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

pub struct CacheLayer {
    store: RwLock<Option<Arc<dyn CacheStore>>>,
    circuit: CircuitBreaker,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheLayer {
    /// A layer with no backend: every read misses, every write is dropped.
    #[must_use]
    pub fn disabled() -> Self {
        Self::build(None, CircuitConfig::cache())
    }

    #[must_use]
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self::build(Some(store), CircuitConfig::cache())
    }

    #[must_use]
    pub fn with_store_and_circuit(store: Arc<dyn CacheStore>, circuit: CircuitConfig) -> Self {
        Self::build(Some(store), circuit)
    }

    fn build(store: Option<Arc<dyn CacheStore>>, circuit: CircuitConfig) -> Self {
        metrics::set_cache_connected(store.is_some());
        Self {
            store: RwLock::new(store),
            circuit: CircuitBreaker::new("cache", circuit),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Best-effort connect to Redis. Never fails: an unreachable or missing
    /// backend yields a disabled layer and a warning.
    pub async fn connect(redis_url: Option<&str>, prefix: &str) -> Self {
        let layer = Self::disabled();
        if let Some(url) = redis_url {
            layer.attach_redis(url, prefix).await;
        } else {
            info!("No cache backend configured, running uncached");
        }
        layer
    }

    /// Try to (re)attach a Redis backend. Returns whether it succeeded.
    pub async fn attach_redis(&self, url: &str, prefix: &str) -> bool {
        let namespace = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}:", prefix)
        };
        match RedisCacheStore::with_prefix(url, Some(&namespace)).await {
            Ok(store) => {
                info!(prefix = %prefix, "Cache backend connected");
                self.attach(Arc::new(store));
                true
            }
            Err(e) => {
                warn!(error = %e, "Cache backend unavailable, continuing without cache");
                false
            }
        }
    }

    pub fn attach(&self, store: Arc<dyn CacheStore>) {
        *self.store.write() = Some(store);
        metrics::set_cache_connected(true);
    }

    /// Drop the backend; subsequent operations are misses/no-ops.
    pub fn disconnect(&self) {
        if self.store.write().take().is_some() {
            info!("Cache backend disconnected");
        }
        metrics::set_cache_connected(false);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.store.read().is_some()
    }

    /// Round-trip liveness check against the backend.
    pub async fn ping(&self) -> bool {
        let Some(store) = self.current() else {
            return false;
        };
        match self.circuit.call(|| store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Cache ping failed");
                false
            }
        }
    }

    fn current(&self) -> Option<Arc<dyn CacheStore>> {
        self.store.read().clone()
    }

    fn note_error(&self, operation: &'static str, key: &str, e: &CircuitError<StorageError>) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_operation(operation, "error");
        match e {
            CircuitError::Rejected => debug!(key, operation, "Cache circuit open, skipping"),
            CircuitError::Inner(inner) => warn!(key, operation, error = %inner, "Cache backend error"),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let Some(store) = self.current() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match self.circuit.call(|| store.get(key)).await {
            Ok(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_operation("get", "hit");
                Some(value)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_operation("get", "miss");
                None
            }
            Err(e) => {
                self.note_error("get", key, &e);
                None
            }
        }
    }

    /// Read and decode. An undecodable entry counts as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let Some(store) = self.current() else {
            return;
        };

        match self.circuit.call(|| store.set(key, value, ttl)).await {
            Ok(()) => metrics::record_cache_operation("set", "ok"),
            Err(e) => self.note_error("set", key, &e),
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => warn!(key, error = %e, "Value not serializable, not caching"),
        }
    }

    pub async fn del(&self, key: &str) {
        let Some(store) = self.current() else {
            return;
        };

        match self.circuit.call(|| store.delete(key)).await {
            Ok(()) => metrics::record_cache_operation("del", "ok"),
            Err(e) => self.note_error("del", key, &e),
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCache;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_disabled_layer_is_a_noop() {
        let cache = CacheLayer::disabled();
        cache.set("k", "v", Duration::from_secs(60)).await;

        assert!(cache.get("k").await.is_none());
        assert!(!cache.is_connected());
        assert!(!cache.ping().await);
    }

    #[tokio::test]
    async fn test_round_trip_through_memory_backend() {
        let cache = CacheLayer::with_store(Arc::new(InMemoryCache::new()));
        cache.set_json("k", &vec![1, 2, 3], Duration::from_secs(60)).await;

        let back: Option<Vec<i32>> = cache.get_json("k").await;
        assert_eq!(back, Some(vec![1, 2, 3]));

        cache.del("k").await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, errors: 0 });
    }

    #[tokio::test]
    async fn test_backend_errors_become_misses() {
        let cache = CacheLayer::with_store_and_circuit(Arc::new(BrokenStore), CircuitConfig::test());

        cache.set("k", "v", Duration::from_secs(60)).await;
        cache.del("k").await;
        for _ in 0..5 {
            assert!(cache.get("k").await.is_none());
        }

        assert_eq!(cache.stats().errors, 7);
        assert!(cache.is_connected());
        assert!(!cache.ping().await);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let backend = Arc::new(InMemoryCache::new());
        backend.set("k", "not json", Duration::from_secs(60)).await.unwrap();
        let cache = CacheLayer::with_store(backend);

        let value: Option<Vec<u32>> = cache.get_json("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_detaches_backend() {
        let cache = CacheLayer::with_store(Arc::new(InMemoryCache::new()));
        cache.set("k", "v", Duration::from_secs(60)).await;

        cache.disconnect();

        assert!(!cache.is_connected());
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_connect_without_url_is_disabled() {
        let cache = CacheLayer::connect(None, "pokedex").await;
        assert!(!cache.is_connected());
    }
}
