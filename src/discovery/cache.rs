//! Short-lived cache of board search results.
//!
//! Entries are keyed by `(search_dir, base_dir, mode)` and go stale after a
//! fixed TTL. A stale entry or a forced refresh replaces the entry wholesale.
//! Nothing is evicted otherwise; the key space is bounded by the directories
//! a session actually visits.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::finder::{BoardFileRef, WalkMode};

/// Default time a cached listing stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5000);

/// Time source for staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub search_dir: PathBuf,
    pub base_dir: PathBuf,
    pub mode: WalkMode,
}

impl CacheKey {
    pub fn new(
        search_dir: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        mode: WalkMode,
    ) -> Self {
        Self {
            search_dir: search_dir.into(),
            base_dir: base_dir.into(),
            mode,
        }
    }
}

struct CacheEntry {
    boards: Vec<BoardFileRef>,
    stored_at: Instant,
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub walks: u64,
    pub entries: usize,
}

pub struct BoardCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    walks: AtomicU64,
}

impl BoardCache {
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            walks: AtomicU64::new(0),
        }
    }

    // The map holds plain data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The stored result for `key`, if it is younger than the TTL.
    pub fn get_fresh(&self, key: &CacheKey) -> Option<Vec<BoardFileRef>> {
        let now = self.clock.now();
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.boards.clone())
    }

    /// Store `boards` under `key`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, boards: Vec<BoardFileRef>) {
        let stored_at = self.clock.now();
        self.lock().insert(key, CacheEntry { boards, stored_at });
    }

    /// Return the fresh entry for `key`, or run `walk` and store its result.
    ///
    /// `force` skips the lookup and always walks. The lock is not held while
    /// walking, so two concurrent misses on one key may both walk.
    pub fn get_or_walk<F>(&self, key: CacheKey, force: bool, walk: F) -> Vec<BoardFileRef>
    where
        F: FnOnce() -> Vec<BoardFileRef>,
    {
        if !force {
            if let Some(boards) = self.get_fresh(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(dir = %key.search_dir.display(), "board cache hit");
                return boards;
            }
        }

        tracing::trace!(dir = %key.search_dir.display(), force, "board cache miss");
        self.walks.fetch_add(1, Ordering::Relaxed);
        let boards = walk();
        self.insert(key, boards.clone());
        boards
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            walks: self.walks.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn board(name: &str) -> BoardFileRef {
        BoardFileRef {
            name: name.to_string(),
            path: format!("/work/{name}"),
        }
    }

    fn cache() -> (Arc<ManualClock>, BoardCache) {
        let clock = Arc::new(ManualClock::new());
        let cache = BoardCache::with_clock(DEFAULT_CACHE_TTL, clock.clone());
        (clock, cache)
    }

    fn key(dir: &str) -> CacheKey {
        CacheKey::new(dir, dir, WalkMode::Recursive)
    }

    #[test]
    fn test_second_lookup_within_ttl_does_not_walk() {
        let (clock, cache) = cache();
        let walks = Cell::new(0);
        let walk = || {
            walks.set(walks.get() + 1);
            vec![board("a.knbn")]
        };

        let first = cache.get_or_walk(key("/work"), false, walk);
        clock.advance(Duration::from_millis(4999));
        let second = cache.get_or_walk(key("/work"), false, || {
            walks.set(walks.get() + 1);
            vec![board("changed.knbn")]
        });

        assert_eq!(first, second);
        assert_eq!(walks.get(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().walks, 1);
    }

    #[test]
    fn test_expired_entry_is_replaced() {
        let (clock, cache) = cache();
        cache.get_or_walk(key("/work"), false, || vec![board("old.knbn")]);
        clock.advance(DEFAULT_CACHE_TTL);
        let fresh = cache.get_or_walk(key("/work"), false, || vec![board("new.knbn")]);

        assert_eq!(fresh, vec![board("new.knbn")]);
        assert_eq!(cache.stats().walks, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_force_bypasses_fresh_entry() {
        let (_clock, cache) = cache();
        cache.get_or_walk(key("/work"), false, || vec![board("old.knbn")]);
        let forced = cache.get_or_walk(key("/work"), true, || vec![board("new.knbn")]);
        let after = cache.get_or_walk(key("/work"), false, || vec![board("unused.knbn")]);

        assert_eq!(forced, vec![board("new.knbn")]);
        assert_eq!(after, vec![board("new.knbn")]);
        assert_eq!(cache.stats().walks, 2);
    }

    #[test]
    fn test_keys_differ_by_base_dir_and_mode() {
        let (_clock, cache) = cache();
        cache.insert(CacheKey::new("/work/sub", "/work/sub", WalkMode::Recursive), vec![]);
        cache.insert(CacheKey::new("/work/sub", "/work", WalkMode::Recursive), vec![]);
        cache.insert(CacheKey::new("/work/sub", "/work/sub", WalkMode::Shallow), vec![]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_get_fresh_misses_unknown_key() {
        let (_clock, cache) = cache();
        assert!(cache.get_fresh(&key("/nowhere")).is_none());
        assert!(cache.is_empty());
    }
}
