use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::order::{EntryId, RecencyOrder};

/// Upper bound on slots reserved at construction. Larger caches grow as
/// entries arrive.
const PREALLOCATE_LIMIT: usize = 1024;

/// Hit/miss/eviction counters for one cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub updates: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of `get` calls that hit, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// A fixed-capacity least-recently-used cache.
///
/// Lookups go through a `HashMap` from key to an arena handle; recency is
/// kept by an arena-backed linked list that owns the entries. `get` and
/// `put` are O(1). A miss is always reported as `None`.
///
/// The cache is not synchronized. Wrap it in a `Mutex` to share it, since
/// even `get` reorders entries.
pub struct LruCache<K, V> {
    capacity: usize,
    index: HashMap<K, EntryId>,
    order: RecencyOrder<K, V>,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// Fails with [`Error::InvalidConfiguration`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "capacity must be positive".to_string(),
            ));
        }
        log::debug!("created LRU cache with capacity {capacity}");
        let reserve = capacity.min(PREALLOCATE_LIMIT);
        Ok(Self {
            capacity,
            index: HashMap::with_capacity(reserve),
            order: RecencyOrder::with_capacity(reserve),
            stats: CacheStats::default(),
        })
    }

    /// Like [`LruCache::new`] but takes a signed capacity, as read from
    /// untyped input. Negative values are rejected the same way as zero.
    pub fn with_signed_capacity(capacity: i64) -> Result<Self> {
        let capacity = usize::try_from(capacity).map_err(|_| {
            Error::InvalidConfiguration(format!("capacity must be positive, got {capacity}"))
        })?;
        Self::new(capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Look up `key` and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.touch(key)?;
        Some(&self.order.entry(id).value)
    }

    /// Mutable variant of [`LruCache::get`]; also promotes the entry.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.touch(key)?;
        Some(&mut self.order.entry_mut(id).value)
    }

    /// Look up `key` without changing its recency or the stats.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &id = self.index.get(key)?;
        Some(&self.order.entry(id).value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or update `key`, making it the most recently used entry.
    ///
    /// Inserting a new key into a full cache evicts the least recently
    /// used entry first.
    pub fn put(&mut self, key: K, value: V) {
        self.push(key, value);
    }

    /// Same as [`LruCache::put`], but hands back what left the cache: the
    /// evicted pair, or the previous value when `key` was already present.
    pub fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&id) = self.index.get(&key) {
            let old = std::mem::replace(&mut self.order.entry_mut(id).value, value);
            self.order.move_to_front(id);
            self.stats.updates += 1;
            return Some((key, old));
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let id = self.order.insert_front(key.clone(), value);
        self.index.insert(key, id);
        self.stats.insertions += 1;
        evicted
    }

    /// Remove `key` regardless of its position.
    pub fn pop<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        Some(self.order.remove(id).value)
    }

    /// Remove and return the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let entry = self.order.remove_tail()?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// The entry that the next insertion of a new key would evict.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let entry = self.order.entry(self.order.tail()?);
        Some((&entry.key, &entry.value))
    }

    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        let entry = self.order.entry(self.order.head()?);
        Some((&entry.key, &entry.value))
    }

    /// Entries from most to least recently used. Does not promote.
    pub fn iter(&self) -> crate::order::Iter<'_, K, V> {
        self.order.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|(k, _)| k)
    }

    /// Drop all entries. Capacity and stats are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    fn touch<Q>(&mut self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&id) => {
                self.order.move_to_front(id);
                self.stats.hits += 1;
                Some(id)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let entry = self.order.remove_tail()?;
        self.index.remove(&entry.key);
        self.stats.evictions += 1;
        log::trace!(
            "evicted least recently used entry ({} of {} slots in use)",
            self.index.len(),
            self.capacity
        );
        Some((entry.key, entry.value))
    }
}

impl<K: Hash + Eq + Clone, V> Extend<(K, V)> for LruCache<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("entries", &DebugEntries(&self.order))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(&'a RecencyOrder<K, V>);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DebugEntries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<String, i32> {
        LruCache::new(capacity).unwrap()
    }

    /// Index and order must describe the same key set.
    fn assert_consistent(cache: &LruCache<String, i32>) {
        let walked: Vec<&String> = cache.keys().collect();
        assert_eq!(walked.len(), cache.index.len());
        assert_eq!(cache.order.len(), cache.index.len());
        for key in walked {
            assert!(cache.index.contains_key(key), "{key} walked but not indexed");
        }
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = LruCache::<String, i32>::new(0).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        for capacity in [0, -1, i64::MIN] {
            let err = LruCache::<String, i32>::with_signed_capacity(capacity).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)), "{capacity}");
        }
        assert_eq!(
            LruCache::<String, i32>::with_signed_capacity(3).unwrap().capacity(),
            3
        );
    }

    #[test]
    fn huge_capacity_does_not_reserve_up_front() {
        let mut c: LruCache<String, String> = LruCache::new(usize::MAX).unwrap();
        assert_eq!(c.capacity(), usize::MAX);
        c.put("a".into(), "1".into());
        c.put("b".into(), "2".into());
        assert_eq!(c.get("a"), Some(&"1".to_string()));
        assert_eq!(c.len(), 2);

        let c = LruCache::<String, String>::with_signed_capacity(i64::MAX).unwrap();
        assert_eq!(c.capacity(), i64::MAX as usize);
    }

    #[test]
    fn new_cache_is_empty() {
        let c = cache(4);
        assert_eq!(c.len(), 0);
        assert!(c.is_empty());
        assert_eq!(c.capacity(), 4);
        assert!(c.peek_lru().is_none());
        assert!(c.peek_mru().is_none());
    }

    #[test]
    fn push_reports_evicted_pair() {
        let mut c = cache(2);
        assert_eq!(c.push("a".into(), 1), None);
        assert_eq!(c.push("b".into(), 2), None);
        assert_eq!(c.push("c".into(), 3), Some(("a".to_string(), 1)));
        assert_eq!(c.stats().evictions, 1);
        assert_consistent(&c);
    }

    #[test]
    fn push_existing_key_returns_old_value() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        assert_eq!(c.push("a".into(), 5), Some(("a".to_string(), 1)));
        assert_eq!(c.len(), 1);
        assert_eq!(c.stats().updates, 1);
        assert_eq!(c.stats().evictions, 0);
    }

    #[test]
    fn capacity_one_keeps_only_latest() {
        let mut c = cache(1);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("b"), Some(&2));
        c.put("b".into(), 3);
        assert_eq!(c.get("b"), Some(&3));
        assert_eq!(c.len(), 1);
        assert_consistent(&c);
    }

    #[test]
    fn peek_and_contains_do_not_promote() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        assert_eq!(c.peek("a"), Some(&1));
        assert!(c.contains("a"));
        c.put("c".into(), 3);
        assert!(!c.contains("a"));
        assert_eq!(c.stats().hits, 0);
        assert_eq!(c.stats().misses, 0);
    }

    #[test]
    fn get_mut_promotes_and_mutates() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        *c.get_mut("a").unwrap() += 10;
        c.put("c".into(), 3);
        assert_eq!(c.peek("a"), Some(&11));
        assert!(!c.contains("b"));
    }

    #[test]
    fn pop_removes_from_middle() {
        let mut c = cache(3);
        c.extend([("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]);
        assert_eq!(c.pop("b"), Some(2));
        assert_eq!(c.pop("b"), None);
        assert_eq!(c.keys().cloned().collect::<Vec<_>>(), vec!["c", "a"]);
        assert_consistent(&c);

        // The freed slot takes the next insertion without evicting.
        c.put("d".into(), 4);
        assert_eq!(c.len(), 3);
        assert_eq!(c.stats().evictions, 0);
        assert_consistent(&c);
    }

    #[test]
    fn pop_lru_and_peeks_follow_order() {
        let mut c = cache(3);
        c.extend([("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]);
        c.get("a");
        assert_eq!(c.peek_mru(), Some((&"a".to_string(), &1)));
        assert_eq!(c.peek_lru(), Some((&"b".to_string(), &2)));
        assert_eq!(c.pop_lru(), Some(("b".to_string(), 2)));
        assert_eq!(c.pop_lru(), Some(("c".to_string(), 3)));
        assert_eq!(c.pop_lru(), Some(("a".to_string(), 1)));
        assert_eq!(c.pop_lru(), None);
        assert!(c.is_empty());
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        c.get("a");
        c.get("a");
        c.get("zzz");
        assert_eq!(c.stats().hits, 2);
        assert_eq!(c.stats().misses, 1);
        assert!((c.stats().hit_rate() - 2.0 / 3.0).abs() < 1e-9);

        c.reset_stats();
        assert_eq!(c.stats(), &CacheStats::default());
        assert_eq!(c.stats().hit_rate(), 0.0);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.capacity(), 2);
        assert_eq!(c.get("a"), None);
        c.put("c".into(), 3);
        assert_eq!(c.get("c"), Some(&3));
        assert_consistent(&c);
    }

    #[test]
    fn debug_lists_entries_mru_first() {
        let mut c = cache(2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        let dbg = format!("{c:?}");
        assert!(dbg.contains("capacity: 2"));
        assert!(dbg.find("\"b\"").unwrap() < dbg.find("\"a\"").unwrap());
    }
}
