//! Injected cache for slow-changing aggregate reads.
//!
//! Single-process deployments use the moka-backed implementation;
//! multi-instance deployments plug an external store behind the same
//! trait so limits do not fragment across instances. Invalidation is by
//! TTL expiry only.

use moka::sync::Cache;
use std::time::Duration;

/// Cache for aggregate values keyed by an opaque string
pub trait AggregateCache: Send + Sync {
    /// Fetch a cached value
    fn get(&self, key: &str) -> Option<u64>;
    /// Store a value until its TTL elapses
    fn put(&self, key: String, value: u64);
}

/// Single-process TTL cache
pub struct MokaAggregateCache {
    inner: Cache<String, u64>,
}

impl MokaAggregateCache {
    /// Create a cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(65_536)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }
}

impl Default for MokaAggregateCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl AggregateCache for MokaAggregateCache {
    fn get(&self, key: &str) -> Option<u64> {
        self.inner.get(key)
    }

    fn put(&self, key: String, value: u64) {
        self.inner.insert(key, value);
    }
}

/// Cache that stores nothing; every read goes to the source
pub struct NoopCache;

impl AggregateCache for NoopCache {
    fn get(&self, _key: &str) -> Option<u64> {
        None
    }

    fn put(&self, _key: String, _value: u64) {}
}
