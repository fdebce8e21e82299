//! Process-wide counters for lookups, transports and buffers.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct Diagnostics {
    queries_started: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    udp_attempts: AtomicU64,
    tcp_attempts: AtomicU64,
    tcp_connections_opened: AtomicU64,
    tcp_connections_reused: AtomicU64,
    tcp_connections_discarded: AtomicU64,
    buffers_allocated: AtomicU64,
    buffers_reused: AtomicU64,
    buffers_released: AtomicU64,
}

static GLOBAL: Diagnostics = Diagnostics {
    queries_started: AtomicU64::new(0),
    cache_hits: AtomicU64::new(0),
    cache_misses: AtomicU64::new(0),
    udp_attempts: AtomicU64::new(0),
    tcp_attempts: AtomicU64::new(0),
    tcp_connections_opened: AtomicU64::new(0),
    tcp_connections_reused: AtomicU64::new(0),
    tcp_connections_discarded: AtomicU64::new(0),
    buffers_allocated: AtomicU64::new(0),
    buffers_reused: AtomicU64::new(0),
    buffers_released: AtomicU64::new(0),
};

/// Point-in-time copy of the global counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub queries_started: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub udp_attempts: u64,
    pub tcp_attempts: u64,
    pub tcp_connections_opened: u64,
    pub tcp_connections_reused: u64,
    pub tcp_connections_discarded: u64,
    pub buffers_allocated: u64,
    pub buffers_reused: u64,
    pub buffers_released: u64,
}

impl Diagnostics {
    pub fn global() -> &'static Diagnostics {
        &GLOBAL
    }

    pub fn snapshot() -> DiagnosticsSnapshot {
        let d = &GLOBAL;
        DiagnosticsSnapshot {
            queries_started: d.queries_started.load(Ordering::Relaxed),
            cache_hits: d.cache_hits.load(Ordering::Relaxed),
            cache_misses: d.cache_misses.load(Ordering::Relaxed),
            udp_attempts: d.udp_attempts.load(Ordering::Relaxed),
            tcp_attempts: d.tcp_attempts.load(Ordering::Relaxed),
            tcp_connections_opened: d.tcp_connections_opened.load(Ordering::Relaxed),
            tcp_connections_reused: d.tcp_connections_reused.load(Ordering::Relaxed),
            tcp_connections_discarded: d.tcp_connections_discarded.load(Ordering::Relaxed),
            buffers_allocated: d.buffers_allocated.load(Ordering::Relaxed),
            buffers_reused: d.buffers_reused.load(Ordering::Relaxed),
            buffers_released: d.buffers_released.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn query_started(&self) {
        self.queries_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn udp_attempt(&self) {
        self.udp_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tcp_attempt(&self) {
        self.tcp_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tcp_connection_opened(&self) {
        self.tcp_connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tcp_connection_reused(&self) {
        self.tcp_connections_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tcp_connection_discarded(&self) {
        self.tcp_connections_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn buffer_allocated(&self) {
        self.buffers_allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn buffer_reused(&self) {
        self.buffers_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn buffer_released(&self) {
        self.buffers_released.fetch_add(1, Ordering::Relaxed);
    }
}

impl DiagnosticsSnapshot {
    /// Counter increases between `earlier` and `self`.
    pub fn since(&self, earlier: &DiagnosticsSnapshot) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            queries_started: self.queries_started - earlier.queries_started,
            cache_hits: self.cache_hits - earlier.cache_hits,
            cache_misses: self.cache_misses - earlier.cache_misses,
            udp_attempts: self.udp_attempts - earlier.udp_attempts,
            tcp_attempts: self.tcp_attempts - earlier.tcp_attempts,
            tcp_connections_opened: self.tcp_connections_opened - earlier.tcp_connections_opened,
            tcp_connections_reused: self.tcp_connections_reused - earlier.tcp_connections_reused,
            tcp_connections_discarded: self.tcp_connections_discarded
                - earlier.tcp_connections_discarded,
            buffers_allocated: self.buffers_allocated - earlier.buffers_allocated,
            buffers_reused: self.buffers_reused - earlier.buffers_reused,
            buffers_released: self.buffers_released - earlier.buffers_released,
        }
    }
}
