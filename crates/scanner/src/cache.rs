//! Bounded memory of already-processed transaction ids.

use std::collections::{HashSet, VecDeque};

/// A FIFO-evicting set of transaction ids the scanner has already dealt
/// with.
///
/// Insertion order is the eviction order: once the cache is full, inserting
/// a new id evicts the oldest one. Re-inserting a present id is a no-op and
/// does not refresh its position.
#[derive(Debug)]
pub struct KnownTxCache {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl KnownTxCache {
    /// Creates a cache holding at most `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(1024)),
            members: HashSet::with_capacity(capacity.min(1024)),
        }
    }

    /// Whether the id is currently remembered.
    pub fn contains(&self, txid: &str) -> bool {
        self.members.contains(txid)
    }

    /// Remembers an id, evicting the oldest entry when full.
    pub fn insert(&mut self, txid: &str) {
        if self.members.contains(txid) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        self.order.push_back(txid.to_string());
        self.members.insert(txid.to_string());
    }

    /// Number of remembered ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
