//! Normalization cache: bounded LRU map from raw line to computed output
//!
//! Log files repeat themselves; the cache lets a processor skip matching for
//! lines it has already normalized. Overflow evicts the least-recently
//! accessed entry, it never rejects an insert.

use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;

/// A bounded least-recently-used cache keyed by line text.
///
/// A capacity of zero disables caching: every lookup is a miss and nothing
/// is stored.
///
/// # Example
///
/// ```
/// use lognorm::LineCache;
///
/// let mut cache = LineCache::new(2);
/// let mut calls = 0;
/// let a = cache.get_or_compute("a", |l| { calls += 1; l.to_uppercase() });
/// let again = cache.get_or_compute("a", |l| { calls += 1; l.to_uppercase() });
/// assert_eq!(a, again);
/// assert_eq!(calls, 1);
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
/// ```
pub struct LineCache<V> {
    entries: Option<LruCache<String, V>>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> LineCache<V> {
    /// Create a cache holding at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up `line`, marking it most recently used on a hit.
    ///
    /// Counts one hit or one miss.
    pub fn get(&mut self, line: &str) -> Option<V> {
        let found = self
            .entries
            .as_mut()
            .and_then(|entries| entries.get(line).cloned());
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Store `value` for `line` as the most recently used entry.
    ///
    /// Returns the key evicted to make room, if any. Replacing the value of
    /// an existing key evicts nothing.
    pub fn insert(&mut self, line: &str, value: V) -> Option<String> {
        let entries = self.entries.as_mut()?;
        match entries.push(line.to_string(), value) {
            Some((evicted, _)) if evicted != line => Some(evicted),
            _ => None,
        }
    }

    /// Return the cached value for `line`, or compute, store and return it.
    ///
    /// `compute` runs only on a miss.
    pub fn get_or_compute<F>(&mut self, line: &str, compute: F) -> V
    where
        F: FnOnce(&str) -> V,
    {
        if let Some(value) = self.get(line) {
            return value;
        }
        let value = compute(line);
        self.insert(line, value.clone());
        value
    }

    /// Returns `true` if `line` is cached. Does not touch recency or counters.
    #[must_use]
    pub fn contains(&self, line: &str) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.contains(line))
    }

    /// Drop every entry. Hit and miss counters keep accumulating.
    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    /// Number of cached lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached lines.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.cap().get())
    }

    /// Lookups served from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl<V> fmt::Debug for LineCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCache")
            .field("len", &self.entries.as_ref().map_or(0, LruCache::len))
            .field(
                "capacity",
                &self.entries.as_ref().map_or(0, |e| e.cap().get()),
            )
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_runs_once_per_line() {
        let mut cache = LineCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_compute("line", |l| {
                calls += 1;
                l.len()
            });
            assert_eq!(v, 4);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut cache = LineCache::new(3);
        for i in 0..100 {
            cache.insert(&format!("line {i}"), i);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        // Capacity 2; lines A, B, C, A: C evicts A, so the second A misses.
        let mut cache = LineCache::new(2);
        let mut computed = Vec::new();
        for line in ["A", "B", "C", "A"] {
            cache.get_or_compute(line, |l| {
                computed.push(l.to_string());
                l.to_lowercase()
            });
        }
        assert_eq!(computed, vec!["A", "B", "C", "A"]);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 4);
    }

    #[test]
    fn access_refreshes_recency() {
        let mut cache = LineCache::new(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        assert_eq!(cache.get("A"), Some(1));
        // B is now least recently used.
        assert_eq!(cache.insert("C", 3), Some("B".to_string()));
        assert!(cache.contains("A"));
        assert!(!cache.contains("B"));
    }

    #[test]
    fn replacing_a_key_evicts_nothing() {
        let mut cache = LineCache::new(1);
        assert_eq!(cache.insert("A", 1), None);
        assert_eq!(cache.insert("A", 2), None);
        assert_eq!(cache.get("A"), Some(2));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = LineCache::new(0);
        let mut calls = 0;
        cache.get_or_compute("x", |_| calls += 1);
        cache.get_or_compute("x", |_| calls += 1);
        assert_eq!(calls, 2);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn clear_forces_recompute() {
        let mut cache = LineCache::new(8);
        let mut calls = 0;
        cache.get_or_compute("x", |_| calls += 1);
        cache.clear();
        cache.get_or_compute("x", |_| calls += 1);
        assert_eq!(calls, 2);
    }
}
