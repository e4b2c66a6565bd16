//! Pool of byte buffers for writer slots.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reusable byte buffers shared by all runs of a program.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
    max_pooled: usize,
    outstanding: AtomicUsize,
}

impl BufferPool {
    /// Create a pool keeping at most `max_pooled` idle buffers of
    /// `capacity` bytes.
    pub fn new(max_pooled: usize, capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            capacity,
            max_pooled,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Take an empty buffer.
    pub fn acquire(&self) -> Vec<u8> {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.capacity))
    }

    /// Return a buffer taken with [`acquire`](Self::acquire).
    pub fn release(&self, mut buffer: Vec<u8>) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        buffer.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_pooled {
            free.push(buffer);
        }
    }

    /// Buffers acquired and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Idle buffers ready for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
