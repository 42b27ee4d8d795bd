//! A bounded FIFO with drop-oldest overflow.

use std::collections::VecDeque;
use std::sync::PoisonError;
use std::sync::RwLock;

struct Inner<T> {
    items: VecDeque<T>,
    /// Entries evicted by overflow. Monotone.
    dropped: u64,
    /// Entries ever appended. Monotone; survives `clear` so per-client
    /// cursors stay valid.
    total_written: u64,
}

/// Fixed-capacity ring buffer. Single writer per kind by convention;
/// concurrent readers snapshot under the read lock.
pub struct RingBuffer<T> {
    inner: RwLock<Inner<T>>,
    cap: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: VecDeque::with_capacity(cap.min(64)),
                dropped: 0,
                total_written: 0,
            }),
            cap,
        }
    }

    pub fn push(&self, item: T) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.items.len() == self.cap {
            inner.items.pop_front();
            inner.dropped += 1;
        }
        inner.items.push_back(item);
        inner.total_written += 1;
    }

    /// Append a batch under a single write lock. Returns the batch size.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut appended = 0;
        for item in items {
            if inner.items.len() == self.cap {
                inner.items.pop_front();
                inner.dropped += 1;
            }
            inner.items.push_back(item);
            inner.total_written += 1;
            appended += 1;
        }
        appended
    }

    /// Snapshot copy, newest first. `limit == 0` means no limit.
    pub fn snapshot_newest_first(&self, limit: usize) -> Vec<T> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let take = if limit == 0 { inner.items.len() } else { limit };
        inner.items.iter().rev().take(take).cloned().collect()
    }

    /// Snapshot copy in insertion order.
    pub fn snapshot_chronological(&self) -> Vec<T> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_written(&self) -> u64 {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.total_written
    }

    pub fn dropped(&self) -> u64 {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.dropped
    }

    /// Empty the buffer. `total_written` and `dropped` are untouched.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.items.clear();
    }
}

#[cfg(test)]
#[path = "ring.test.rs"]
mod tests;
