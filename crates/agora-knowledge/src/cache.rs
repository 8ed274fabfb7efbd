//! Per-topic grounding cache using Moka
//!
//! A debate asks for grounding on every turn; the topic only changes when the
//! session does. Each prepared topic is resolved at most once per entry
//! lifetime, and concurrent requests for the same topic share one resolution.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::resolver::{GroundingResolver, RetrievalResult};
use crate::terms::prepare_topic;

/// Configuration for the grounding cache
#[derive(Debug, Clone)]
pub struct GroundingCacheConfig {
    /// Maximum number of cached topics
    pub max_entries: u64,
    /// Time-to-live for cached entries
    pub ttl: Duration,
}

impl Default for GroundingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Resolver fronted by a topic-keyed cache
#[derive(Debug)]
pub struct GroundingCache {
    resolver: Arc<GroundingResolver>,
    cache: Cache<String, Arc<RetrievalResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GroundingCache {
    pub fn new(resolver: Arc<GroundingResolver>, config: GroundingCacheConfig) -> Self {
        Self {
            resolver,
            cache: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(config.ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create with default configuration
    pub fn wrap(resolver: Arc<GroundingResolver>) -> Self {
        Self::new(resolver, GroundingCacheConfig::default())
    }

    /// Grounding for a debate topic. The words "debate", "discuss" and
    /// "argue" are stripped before resolving.
    pub async fn ground(&self, topic: &str) -> Arc<RetrievalResult> {
        let prepared = prepare_topic(topic);
        let key = prepared.to_lowercase();

        if let Some(cached) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(topic = %prepared, "Grounding cache hit");
            return cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolver = self.resolver.clone();
        self.cache
            .get_with(key, async move { Arc::new(resolver.resolve(&prepared).await) })
            .await
    }

    /// Get cache statistics (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Forget every cached topic. Titles already used stay in the
    /// resolver's title cache.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn resolver(&self) -> &GroundingResolver {
        &self.resolver
    }
}
