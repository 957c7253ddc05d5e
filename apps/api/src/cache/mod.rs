//! Best-effort get-or-compute cache over a remote key-value store.
//!
//! Caching is an optimization only: store failures are logged and counted,
//! never surfaced to callers. Only the fetcher's own errors propagate.

pub mod metrics;
pub mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use store::{CacheError, KeyValueStore, RedisStore};

/// Keys requested per `SCAN` step during pattern deletion.
const SCAN_BATCH: usize = 100;

#[derive(Clone)]
pub struct CacheClient {
    store: Option<Arc<dyn KeyValueStore>>,
    metrics: Arc<CacheMetrics>,
}

impl CacheClient {
    pub fn new(store: Option<Arc<dyn KeyValueStore>>, metrics: Arc<CacheMetrics>) -> Self {
        Self { store, metrics }
    }

    /// A client with no backend. Every lookup falls through to the fetcher.
    pub fn disabled(metrics: Arc<CacheMetrics>) -> Self {
        Self::new(None, metrics)
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Returns the cached value for `key`, or runs `fetcher`, stores its
    /// result for `ttl` and returns it.
    pub async fn with_cache<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.store.is_none() {
            return fetcher().await;
        }

        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = fetcher().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Reads and decodes `key`. Misses, store errors and undecodable payloads
    /// all yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;

        let raw = match store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache read failed for '{key}': {e}");
                self.metrics.record_error();
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!("Cache miss: {key}");
            self.metrics.record_miss();
            return None;
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!("Cache hit: {key}");
                self.metrics.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry '{key}': {e}");
                self.metrics.record_error();
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Encodes and writes `value` with a store-side TTL. Returns whether the
    /// write landed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode cache entry '{key}': {e}");
                self.metrics.record_error();
                return false;
            }
        };

        match store.set_ex(key, &payload, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache write failed for '{key}': {e}");
                self.metrics.record_error();
                false
            }
        }
    }

    /// Deletes every key matching a glob `pattern`, scanning in bounded
    /// batches until the cursor wraps back to zero. Returns how many keys
    /// were removed before any failure.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };

        let mut cursor = 0u64;
        let mut deleted = 0usize;

        loop {
            let (next, keys) = match store.scan(cursor, pattern, SCAN_BATCH).await {
                Ok(step) => step,
                Err(e) => {
                    warn!("Cache scan failed for pattern '{pattern}': {e}");
                    self.metrics.record_error();
                    break;
                }
            };

            if !keys.is_empty() {
                match store.del(&keys).await {
                    Ok(n) => deleted += n,
                    Err(e) => {
                        warn!("Cache delete failed for pattern '{pattern}': {e}");
                        self.metrics.record_error();
                        break;
                    }
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!("Deleted {deleted} cache keys matching '{pattern}'");
        deleted
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}
