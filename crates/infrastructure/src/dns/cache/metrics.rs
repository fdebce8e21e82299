use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

#[derive(Default)]
pub struct CacheMetrics {
    // Hot counters, touched on every lookup.
    pub hits: AtomicU64,
    pub misses: AtomicU64,

    pub insertions: AtomicU64,
    pub expirations: AtomicU64,
    pub removals: AtomicU64,
    pub sweeps: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(AtomicOrdering::Relaxed) as f64;
        let total = hits + self.misses.load(AtomicOrdering::Relaxed) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }

    pub(super) fn record_hit(&self) {
        self.hits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(super) fn record_miss(&self) {
        self.misses.fetch_add(1, AtomicOrdering::Relaxed);
    }
}
