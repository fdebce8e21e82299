use crate::dns::diagnostics::Diagnostics;
use dashmap::DashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Size classes handed out by the pool. Requests round up to the next class.
const SIZE_CLASSES: [usize; 4] = [512, 1232, 4096, 65535];

/// Pool of reusable datagram receive buffers.
///
/// Buffers are grouped by size class. A leased buffer belongs to exactly one
/// in-flight attempt and goes back to the pool when the lease is dropped.
pub struct BufferPool {
    pools: DashMap<usize, Vec<Vec<u8>>>,
    max_per_class: usize,
    total_created: AtomicU64,
    total_reused: AtomicU64,
}

impl BufferPool {
    pub fn new(max_per_class: usize) -> Self {
        Self {
            pools: DashMap::new(),
            max_per_class,
            total_created: AtomicU64::new(0),
            total_reused: AtomicU64::new(0),
        }
    }

    fn size_class(size: usize) -> usize {
        SIZE_CLASSES
            .iter()
            .copied()
            .find(|class| *class >= size)
            .unwrap_or(SIZE_CLASSES[SIZE_CLASSES.len() - 1])
    }

    /// Leases a zeroed buffer of at least `size` octets.
    pub fn acquire(&self, size: usize) -> PooledBuffer<'_> {
        let class = Self::size_class(size);

        let reused = self.pools.get_mut(&class).and_then(|mut entry| entry.pop());
        let buffer = match reused {
            Some(mut buffer) => {
                buffer.iter_mut().for_each(|b| *b = 0);
                self.total_reused.fetch_add(1, Ordering::Relaxed);
                Diagnostics::global().buffer_reused();
                buffer
            }
            None => {
                self.total_created.fetch_add(1, Ordering::Relaxed);
                Diagnostics::global().buffer_allocated();
                debug!(size_class = class, "Allocated datagram buffer");
                vec![0u8; class]
            }
        };

        PooledBuffer {
            buffer: Some(buffer),
            class,
            pool: self,
        }
    }

    fn release(&self, class: usize, buffer: Vec<u8>) {
        Diagnostics::global().buffer_released();
        let mut entry = self.pools.entry(class).or_default();
        if entry.len() < self.max_per_class {
            entry.push(buffer);
        }
    }

    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_pooled: self.pools.iter().map(|e| e.len()).sum(),
        }
    }

    pub fn clear(&self) {
        self.pools.clear();
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Exclusive lease on a pooled buffer.
pub struct PooledBuffer<'a> {
    buffer: Option<Vec<u8>>,
    class: usize,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(self.class, buffer);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    pub total_created: u64,
    pub total_reused: u64,
    pub total_pooled: usize,
}
