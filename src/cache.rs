use crate::LinkData;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Bounded URL → `LinkData` cache with strict insertion-order eviction.
///
/// Reads never refresh an entry's position; the oldest insert is always the
/// first to go once `capacity` is exceeded.
#[derive(Clone)]
pub struct FifoCache {
    entries: Arc<DashMap<String, LinkData>>,
    order: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl FifoCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(capacity)),
            order: Arc::new(Mutex::new(VecDeque::with_capacity(capacity + 1))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &str) -> Option<LinkData> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts `value`, evicting the oldest entries past capacity.
    /// Replacing an existing key keeps its original position.
    pub fn insert(&self, key: String, value: LinkData) {
        if self.capacity == 0 {
            return;
        }

        let mut order = match self.order.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.entries.insert(key.clone(), value).is_none() {
            order.push_back(key);
        }

        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                debug!(url = %oldest, "Evicting oldest cache entry");
                self.entries.remove(&oldest);
            }
        }
    }

    /// Keys from oldest to newest insert.
    pub fn keys(&self) -> Vec<String> {
        match self.order.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}
