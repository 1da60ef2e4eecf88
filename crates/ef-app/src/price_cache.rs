//! Bounded cache of calculated baseline prices keyed by version.
//!
//! Replaces ambient module-level dictionaries: one owner, fixed capacity,
//! FIFO eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

pub struct PriceCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    order: VecDeque<String>,
    prices: HashMap<String, f64>,
}

impl PriceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                order: VecDeque::new(),
                prices: HashMap::new(),
            }),
        }
    }

    pub fn get(&self, version: &str) -> Option<f64> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.prices.get(version).copied()
    }

    pub fn insert(&self, version: &str, price: f64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.prices.insert(version.to_string(), price).is_none() {
            inner.order.push_back(version.to_string());
        }
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.prices.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(32)
    }
}
