// Utility functions for personalization-service

pub mod random;

pub use random::{RandomSource, SeededRandom, ThreadRandom};

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Divide every weight in a bucket by the bucket total.
///
/// An empty (or zero-total) bucket normalizes to an empty map.
pub fn normalize_weights(bucket: &HashMap<String, f64>) -> HashMap<String, f64> {
    let total: f64 = bucket.values().sum();
    if total <= 0.0 || !total.is_finite() {
        return HashMap::new();
    }

    bucket
        .iter()
        .map(|(key, value)| (key.clone(), value / total))
        .collect()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One async mutex per key, created on first use and dropped again once the
/// last holder releases it with nobody waiting.
///
/// Holders of different keys never wait on each other.
#[derive(Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedLockGuard<'_> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;

        KeyedLockGuard {
            locks: &self.locks,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Keys currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock for one key; releasing it evicts the key when unused
pub struct KeyedLockGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map's Arc is the only one left when idle
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
