//! Process-local TTL query cache.
//!
//! Entries expire lazily on read and eagerly through [`QueryCache::cleanup`].
//! Capacity is bounded; when full, inserting a new key evicts the entry that
//! was written least recently. Reads never refresh an entry's position.

use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use metrics::{counter, gauge};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "spotlight_cache_hit_total";
const METRIC_MISS: &str = "spotlight_cache_miss_total";
const METRIC_EVICT: &str = "spotlight_cache_evict_total";
const METRIC_EXPIRED: &str = "spotlight_cache_expired_total";
const METRIC_ENTRIES: &str = "spotlight_cache_entries";

/// Longest TTL honoured; larger values are clamped so the expiry instant cannot overflow.
pub const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

type Payload = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: Payload,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

enum Lookup {
    Missing,
    Expired,
    Live(Payload),
}

/// Bounded, expiring key/value store for memoized read queries.
///
/// Values of any `Send + Sync` type can be stored; a read with a different
/// type than the one written behaves as a miss. All operations serialize on a
/// single mutex, so lazy expiry in [`get`](Self::get) and the sweep in
/// [`cleanup`](Self::cleanup) never interleave.
pub struct QueryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.max_entries_non_zero())
    }

    pub fn with_capacity(max_entries: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_entries)),
        }
    }

    pub fn capacity(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "capacity").cap().get()
    }

    /// Store `value` under `key` for `ttl`.
    ///
    /// Empty keys and zero TTLs are ignored. TTLs above [`MAX_TTL`] are clamped.
    pub fn set<T>(&self, key: &str, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.set_shared(key, Arc::new(value), ttl);
    }

    /// Store an already shared value without re-wrapping it.
    pub fn set_shared<T>(&self, key: &str, value: Arc<T>, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        if key.is_empty() {
            warn!(target = SOURCE, "Ignored cache write with empty key");
            return;
        }
        if ttl.is_zero() {
            warn!(target = SOURCE, key, "Ignored cache write with zero ttl");
            return;
        }

        let entry = CacheEntry {
            value: value as Payload,
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        };

        let mut entries = mutex_lock(&self.entries, SOURCE, "set");
        if let Some((displaced, _)) = entries.push(key.to_string(), entry)
            && displaced != key
        {
            counter!(METRIC_EVICT).increment(1);
            debug!(
                target = SOURCE,
                evicted = %displaced,
                inserted = key,
                "Evicted cache entry at capacity"
            );
        }
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
    }

    /// Fetch a live value. Expired entries are removed and reported as a miss.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let now = Instant::now();
        let lookup = {
            let mut entries = mutex_lock(&self.entries, SOURCE, "get");
            let lookup = match entries.peek(key) {
                None => Lookup::Missing,
                Some(entry) if entry.is_expired(now) => Lookup::Expired,
                Some(entry) => Lookup::Live(Arc::clone(&entry.value)),
            };
            if matches!(lookup, Lookup::Expired) {
                entries.pop(key);
                gauge!(METRIC_ENTRIES).set(entries.len() as f64);
            }
            lookup
        };

        match lookup {
            Lookup::Missing => {
                counter!(METRIC_MISS).increment(1);
                None
            }
            Lookup::Expired => {
                counter!(METRIC_EXPIRED).increment(1);
                counter!(METRIC_MISS).increment(1);
                None
            }
            Lookup::Live(payload) => match payload.downcast::<T>() {
                Ok(value) => {
                    counter!(METRIC_HIT).increment(1);
                    Some(value)
                }
                Err(_) => {
                    debug!(
                        target = SOURCE,
                        key,
                        expected = std::any::type_name::<T>(),
                        "Cached value has a different type; treating as miss"
                    );
                    counter!(METRIC_MISS).increment(1);
                    None
                }
            },
        }
    }

    /// Return the cached value, or run `compute`, store its result and return it.
    ///
    /// An error from `compute` is returned unchanged and nothing is cached.
    /// The cache lock is not held while `compute` runs, so concurrent misses
    /// on the same key may each compute; the last write wins.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            return Ok(hit);
        }

        let value = Arc::new(compute().await?);
        self.set_shared(key, Arc::clone(&value), ttl);
        Ok(value)
    }

    /// Remove `key` if present.
    pub fn delete(&self, key: &str) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete");
        if entries.pop(key).is_some() {
            gauge!(METRIC_ENTRIES).set(entries.len() as f64);
        }
    }

    pub fn clear(&self) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "clear");
        entries.clear();
        gauge!(METRIC_ENTRIES).set(0.0);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "cleanup");
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key.as_str());
        }

        if !expired.is_empty() {
            counter!(METRIC_EXPIRED).increment(expired.len() as u64);
            gauge!(METRIC_ENTRIES).set(entries.len() as f64);
        }
        expired.len()
    }

    /// Delete every key containing `pattern`, returning how many were removed.
    ///
    /// An empty pattern matches every key.
    pub fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "invalidate_by_pattern");
        let matched: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matched {
            entries.pop(key.as_str());
        }

        if !matched.is_empty() {
            gauge!(METRIC_ENTRIES).set(entries.len() as f64);
            debug!(
                target = SOURCE,
                pattern,
                removed = matched.len(),
                "Invalidated cache entries by pattern"
            );
        }
        matched.len()
    }

    /// Whether a live entry exists for `key`. Does not remove expired entries.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        mutex_lock(&self.entries, SOURCE, "contains_key")
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
