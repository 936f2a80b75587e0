//! Assessment cache — memoizes raw model records per (job, criteria, cv).
//!
//! Keyed by a content hash so identical inputs share an entry across runs.
//! Entries expire after `ttl`; when `capacity` is reached the oldest
//! insertion is evicted. The matching engine never sees this layer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

/// Content hash of one model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(Uuid);

impl CacheKey {
    pub fn new(job_text: &str, criteria_text: &str, cv_text: &str) -> Self {
        let mut material = Vec::with_capacity(job_text.len() + criteria_text.len() + cv_text.len() + 2);
        material.extend_from_slice(job_text.as_bytes());
        material.push(0);
        material.extend_from_slice(criteria_text.as_bytes());
        material.push(0);
        material.extend_from_slice(cv_text.as_bytes());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, &material))
    }
}

struct Entry {
    inserted_at: Instant,
    record: Value,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    /// Insertion order, oldest first. May hold keys already dropped on expiry.
    order: VecDeque<CacheKey>,
}

pub struct AssessmentCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    capacity: usize,
}

impl AssessmentCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.record.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, record: Value) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.lock();
        let entry = Entry {
            inserted_at: Instant::now(),
            record,
        };
        if inner.entries.insert(key, entry).is_some() {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push_back(key);

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
        // Drop order slots whose entries already expired out.
        let Inner { entries, order } = &mut *inner;
        order.retain(|k| entries.contains_key(k));
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
