use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Bounded LRU map whose entries also expire after a per-entry TTL.
pub struct Cache<K, V> {
    inner: LruCache<K, (V, Instant)>,
}

impl<K: Hash + Eq, V> Cache<K, V> {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Cache {
            inner: LruCache::new(capacity),
        }
    }

    /// Live value for `key`; an expired entry is dropped on access.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = match self.inner.peek(key) {
            Some((_, expires_at)) => *expires_at <= Instant::now(),
            None => return None,
        };
        if expired {
            self.inner.pop(key);
            return None;
        }
        self.inner.get(key).map(|(value, _)| value)
    }

    pub fn insert(&mut self, key: K, value: V, ttl: Duration) {
        self.inner.put(key, (value, Instant::now() + ttl));
    }
}
