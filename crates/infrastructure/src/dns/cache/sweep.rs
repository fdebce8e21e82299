use super::storage::ResponseCache;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl ResponseCache {
    /// Removes every expired entry. Returns the number removed, or zero if
    /// another sweep is already running.
    pub fn sweep(&self) -> usize {
        if self
            .sweeping
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .is_err()
        {
            return 0;
        }

        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());

        self.metrics.sweeps.fetch_add(1, AtomicOrdering::Relaxed);
        if removed > 0 {
            self.metrics
                .expirations
                .fetch_add(removed as u64, AtomicOrdering::Relaxed);
            debug!(removed, cache_size = self.entries.len(), "Cache sweep completed");
        }

        self.last_sweep_ms.store(
            now.saturating_duration_since(self.epoch).as_millis() as u64,
            AtomicOrdering::Relaxed,
        );
        self.sweeping.store(false, AtomicOrdering::Release);
        removed
    }

    /// Sweeps if the sweep interval has elapsed since the last one.
    pub(super) fn maybe_sweep(&self) {
        let now_ms = Instant::now()
            .saturating_duration_since(self.epoch)
            .as_millis() as u64;
        let last = self.last_sweep_ms.load(AtomicOrdering::Relaxed);
        if now_ms.saturating_sub(last) >= self.sweep_interval.as_millis() as u64 {
            self.sweep();
        }
    }

    /// Periodically sweeps until `shutdown` is cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cache.sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Response cache sweeper shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        cache.sweep();
                    }
                }
            }
        })
    }
}
