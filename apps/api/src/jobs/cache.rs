//! Job-search cache: derives stable keys from search parameters and wraps
//! the generic cache client with a fixed TTL.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheClient;
use crate::jobs::models::{CachedJobData, JobSearchParams, RemotePreference};

pub const KEY_PREFIX: &str = "jobs:search:";

/// Canonical form of `JobSearchParams` used for hashing. Field order is
/// fixed by the struct, so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSearch {
    pub roles: Vec<String>,
    pub locations: Vec<String>,
    pub skills: Vec<String>,
    pub remote_preference: RemotePreference,
    pub salary_min: u32,
    pub salary_max: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_rate: f64,
    pub last_reset: DateTime<Utc>,
    pub configured: bool,
    pub ttl_secs: u64,
}

pub fn normalize(params: &JobSearchParams) -> NormalizedSearch {
    NormalizedSearch {
        roles: normalize_list(&params.roles),
        locations: normalize_list(&params.locations),
        skills: normalize_list(&params.skills),
        remote_preference: params.remote_preference.unwrap_or_default(),
        salary_min: params.salary_min.unwrap_or(0),
        salary_max: params.salary_max.unwrap_or(0),
    }
}

fn normalize_list(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// 32-bit FNV-1a. Stable across processes and compiler versions, unlike
/// `DefaultHasher`. Collisions are not detected.
fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes.iter().fold(OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(PRIME)
    })
}

pub fn cache_key(params: &JobSearchParams) -> String {
    // Serializing a struct of strings and integers cannot fail.
    let canonical = serde_json::to_string(&normalize(params)).unwrap_or_default();
    format!("{KEY_PREFIX}{:08x}", fnv1a_32(canonical.as_bytes()))
}

#[derive(Clone)]
pub struct JobCache {
    cache: CacheClient,
    ttl: Duration,
}

impl JobCache {
    pub fn new(cache: CacheClient, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entries are shared by every equivalent search, so the returned
    /// `search_params` are always the caller's own.
    pub async fn get(&self, params: &JobSearchParams) -> Option<CachedJobData> {
        let mut data: CachedJobData = self.cache.get(&cache_key(params)).await?;
        data.search_params = params.clone();
        Some(data)
    }

    pub async fn set(&self, params: &JobSearchParams, data: &CachedJobData) -> bool {
        self.cache.set(&cache_key(params), data, self.ttl).await
    }

    /// Drops every cached search result. Returns the number of entries removed.
    pub async fn invalidate_all(&self) -> usize {
        self.cache.delete_pattern(&format!("{KEY_PREFIX}*")).await
    }

    pub async fn with_cache<E, F, Fut>(&self, params: &JobSearchParams, fetcher: F) -> Result<CachedJobData, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedJobData, E>>,
    {
        let mut data = self
            .cache
            .with_cache(&cache_key(params), self.ttl, fetcher)
            .await?;
        data.search_params = params.clone();
        Ok(data)
    }

    pub fn reset_stats(&self) {
        self.cache.reset_metrics();
    }

    pub fn stats(&self) -> JobCacheStats {
        let snap = self.cache.metrics().snapshot();
        JobCacheStats {
            hit_rate: snap.hit_rate(),
            hits: snap.hits,
            misses: snap.misses,
            errors: snap.errors,
            last_reset: snap.last_reset,
            configured: self.cache.is_configured(),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::cache::store::memory::MemoryStore;
    use crate::cache::CacheMetrics;

    fn params(roles: &[&str], locations: &[&str], skills: &[&str]) -> JobSearchParams {
        JobSearchParams {
            roles: roles.iter().map(|s| s.to_string()).collect(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            remote_preference: None,
            salary_min: None,
            salary_max: None,
        }
    }

    fn sample_data(params: &JobSearchParams) -> CachedJobData {
        let now = Utc::now();
        CachedJobData {
            jobs: Vec::new(),
            cached_at: now,
            expires_at: now + chrono::Duration::hours(1),
            source_counts: BTreeMap::from([("greenhouse:acme".to_string(), 0)]),
            search_params: params.clone(),
        }
    }

    fn memory_job_cache() -> JobCache {
        let client = CacheClient::new(
            Some(Arc::new(MemoryStore::new())),
            Arc::new(CacheMetrics::new()),
        );
        JobCache::new(client, Duration::from_secs(60))
    }

    #[test]
    fn test_key_ignores_list_ordering() {
        let a = params(&["Backend Engineer", "SRE"], &["Berlin", "Remote"], &["rust", "go"]);
        let b = params(&["SRE", "Backend Engineer"], &["Remote", "Berlin"], &["go", "rust"]);
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_key_ignores_case_whitespace_and_duplicates() {
        let a = params(&["  sre ", "SRE"], &[], &[]);
        let b = params(&["sre"], &[], &[]);
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_missing_scalars_equal_neutral_defaults() {
        let a = params(&["sre"], &[], &[]);
        let mut b = a.clone();
        b.remote_preference = Some(RemotePreference::Any);
        b.salary_min = Some(0);
        b.salary_max = Some(0);
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_key_differs_for_different_filters() {
        let a = params(&["sre"], &[], &[]);
        let mut b = a.clone();
        b.salary_min = Some(120_000);
        let mut c = a.clone();
        c.remote_preference = Some(RemotePreference::Remote);

        assert_ne!(cache_key(&a), cache_key(&b));
        assert_ne!(cache_key(&a), cache_key(&c));
        assert_ne!(cache_key(&a), cache_key(&params(&["swe"], &[], &[])));
    }

    #[test]
    fn test_key_format() {
        let key = cache_key(&JobSearchParams::default());
        let suffix = key.strip_prefix(KEY_PREFIX).unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[tokio::test]
    async fn test_get_set_roundtrip_with_reordered_params() {
        let cache = memory_job_cache();
        let stored = params(&["a", "b"], &[], &[]);
        let data = sample_data(&stored);

        assert!(cache.set(&stored, &data).await);

        let lookup = params(&["B", "a"], &[], &[]);
        let found = cache.get(&lookup).await.unwrap();
        assert_eq!(found.jobs, data.jobs);
        assert_eq!(found.cached_at, data.cached_at);
        assert_eq!(found.search_params, lookup);
    }

    #[tokio::test]
    async fn test_with_cache_hit_echoes_callers_params() {
        let cache = memory_job_cache();
        let first = params(&["Backend Engineer", "sre"], &["Berlin"], &[]);
        let second = params(&["SRE", " backend engineer "], &["berlin"], &[]);

        let stored: Result<CachedJobData, anyhow::Error> =
            cache.with_cache(&first, || async { Ok(sample_data(&first)) }).await;
        assert_eq!(stored.unwrap().search_params, first);

        let hit: Result<CachedJobData, anyhow::Error> = cache
            .with_cache(&second, || async { Err(anyhow::anyhow!("should be served from cache")) })
            .await;
        assert_eq!(hit.unwrap().search_params, second);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_with_cache_fetches_once() {
        let cache = memory_job_cache();
        let p = params(&["sre"], &["berlin"], &[]);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: Result<CachedJobData, anyhow::Error> = cache
                .with_cache(&p, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_data(&p))
                })
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.configured);
        assert_eq!(stats.ttl_secs, 60);
    }

    #[tokio::test]
    async fn test_invalidate_all_removes_only_search_entries() {
        let client = CacheClient::new(
            Some(Arc::new(MemoryStore::new())),
            Arc::new(CacheMetrics::new()),
        );
        let cache = JobCache::new(client.clone(), Duration::from_secs(60));

        for role in ["a", "b", "c"] {
            let p = params(&[role], &[], &[]);
            cache.set(&p, &sample_data(&p)).await;
        }
        client.set("profile:1", &"keep", Duration::from_secs(60)).await;

        assert_eq!(cache.invalidate_all().await, 3);
        assert!(cache.get(&params(&["a"], &[], &[])).await.is_none());
        assert_eq!(client.get::<String>("profile:1").await.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn test_stats_when_unconfigured() {
        let cache = JobCache::new(
            CacheClient::disabled(Arc::new(CacheMetrics::new())),
            Duration::from_secs(3600),
        );
        assert_eq!(cache.invalidate_all().await, 0);
        let stats = cache.stats();
        assert!(!stats.configured);
        assert_eq!(stats.hit_rate, 0.0);
    }
}
