use super::key::CacheKey;
use super::metrics::CacheMetrics;
use crate::dns::diagnostics::Diagnostics;
use dashmap::DashMap;
use ferrous_lookup_domain::{LookupSettings, QueryResponse};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

pub(super) struct CacheEntry {
    pub(super) response: QueryResponse,
    pub(super) inserted: Instant,
    pub(super) ttl: Duration,
}

impl CacheEntry {
    #[inline]
    pub(super) fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted) >= self.ttl
    }
}

/// TTL-indexed memo of responses keyed by question identity.
///
/// Expiry is checked lazily on lookup; expired entries that are never looked
/// up again are removed by [`ResponseCache::sweep`].
pub struct ResponseCache {
    pub(super) entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    pub(super) metrics: Arc<CacheMetrics>,
    pub(super) sweep_interval: Duration,
    pub(super) sweeping: AtomicBool,
    pub(super) epoch: Instant,
    pub(super) last_sweep_ms: AtomicU64,
}

impl ResponseCache {
    pub fn new(sweep_interval: Duration) -> Self {
        info!(
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            "Initializing response cache"
        );

        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            metrics: Arc::new(CacheMetrics::default()),
            sweep_interval,
            sweeping: AtomicBool::new(false),
            epoch: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &LookupSettings) -> Self {
        Self::new(settings.cache_sweep_interval())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the cached response for `key` with every record TTL reduced
    /// by the entry's age, or `None` when absent or expired.
    pub fn get(&self, key: &CacheKey) -> Option<QueryResponse> {
        let now = Instant::now();

        let hit = self.entries.get(key).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                let age = now.saturating_duration_since(entry.inserted).as_secs();
                Some(
                    entry
                        .response
                        .aged_by(u32::try_from(age).unwrap_or(u32::MAX))
                        .served_from_cache(),
                )
            }
        });

        match hit {
            Some(response) => {
                self.metrics.record_hit();
                Diagnostics::global().cache_hit();
                debug!(key = %key, "Cache hit");
                Some(response)
            }
            None => {
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.metrics
                        .expirations
                        .fetch_add(1, AtomicOrdering::Relaxed);
                    debug!(key = %key, "Cache entry expired");
                }
                self.metrics.record_miss();
                Diagnostics::global().cache_miss();
                None
            }
        }
    }

    /// Effective lifetime of `response` under `settings`, or `None` when it
    /// must not be cached.
    pub fn effective_ttl(response: &QueryResponse, settings: &LookupSettings) -> Option<Duration> {
        if response.has_error() {
            return settings
                .cache_failed_results()
                .then(|| settings.failed_results_cache_duration())
                .filter(|ttl| !ttl.is_zero());
        }

        let min_ttl = response.message().min_ttl()?;
        if min_ttl == 0 {
            return None;
        }

        let mut ttl = Duration::from_secs(u64::from(min_ttl));
        if let Some(floor) = settings.minimum_cache_timeout() {
            ttl = ttl.max(floor);
        }
        if let Some(ceiling) = settings.maximum_cache_timeout() {
            ttl = ttl.min(ceiling);
        }
        (!ttl.is_zero()).then_some(ttl)
    }

    /// Stores `response` under `key` if its TTL policy allows it. Returns
    /// whether an entry was written.
    pub fn add(&self, key: CacheKey, response: &QueryResponse, settings: &LookupSettings) -> bool {
        let Some(ttl) = Self::effective_ttl(response, settings) else {
            debug!(key = %key, "Response not cacheable");
            return false;
        };

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Caching response");
        self.entries.insert(
            key,
            CacheEntry {
                response: response.clone().with_audit_trail(None),
                inserted: Instant::now(),
                ttl,
            },
        );
        self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);

        self.maybe_sweep();
        true
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.metrics.removals.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(key = %key, "Removed response from cache");
        }
        removed
    }

    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        info!(entries = count, "Response cache cleared");
    }
}
