//! Counter storage for fixed-window quotas.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::category::Category;

/// Requests admitted in the current window of one (category, identity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    /// Requests admitted so far in this window
    pub count: u64,
    /// When the window ends, in milliseconds since the Unix epoch
    pub reset_time_ms: u64,
}

impl CounterEntry {
    /// Start a new window at `now_ms`.
    pub fn fresh(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_time_ms: now_ms.saturating_add(window_ms),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.reset_time_ms
    }
}

/// Build the store key for a category and identity.
pub fn counter_key(category: Category, identity: &str) -> String {
    format!("{}:{}", category, identity)
}

/// Storage port for quota counters.
///
/// The in-memory implementation is process local; a shared cache can be
/// substituted as long as `update` is atomic per key.
pub trait CounterStore: Send + Sync {
    /// Read the entry for `key`.
    fn get(&self, key: &str) -> Option<CounterEntry>;

    /// Atomically replace the entry for `key`.
    ///
    /// `f` receives the current entry and returns the entry to store, or
    /// `None` to leave it untouched. Returns the entry as it stands after
    /// the update.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&CounterEntry>) -> Option<CounterEntry>,
    ) -> Option<CounterEntry>;

    /// Drop every entry whose window has ended. Returns how many were removed.
    fn remove_expired(&self, now_ms: u64) -> usize;

    /// Number of tracked entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    fn clear(&self);
}

/// Process-local store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CounterEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CounterEntry> {
        self.entries.get(key).map(|e| *e.value())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&CounterEntry>) -> Option<CounterEntry>,
    ) -> Option<CounterEntry> {
        // The shard stays locked until the guard drops, which makes the
        // read-check-write below atomic for this key.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Some(next) = f(Some(occupied.get())) {
                    occupied.insert(next);
                }
                Some(*occupied.get())
            }
            Entry::Vacant(vacant) => {
                let next = f(None)?;
                vacant.insert(next);
                Some(next)
            }
        }
    }

    fn remove_expired(&self, now_ms: u64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now_ms);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_key_format() {
        assert_eq!(counter_key(Category::Auth, "user:42"), "auth:user:42");
        assert_eq!(
            counter_key(Category::EstimateUpload, "10.0.0.1"),
            "estimateUpload:10.0.0.1"
        );
    }

    #[test]
    fn test_fresh_entry() {
        let entry = CounterEntry::fresh(1_000, 60_000);
        assert_eq!(entry.count, 1);
        assert_eq!(entry.reset_time_ms, 61_000);
        assert!(!entry.is_expired(60_999));
        assert!(entry.is_expired(61_000));
    }

    #[test]
    fn test_update_inserts_and_increments() {
        let store = MemoryStore::new();

        let created = store.update("k", &mut |_| Some(CounterEntry::fresh(0, 1_000)));
        assert_eq!(created.map(|e| e.count), Some(1));

        store.update("k", &mut |current| {
            current.map(|e| CounterEntry {
                count: e.count + 1,
                ..*e
            })
        });
        assert_eq!(store.get("k").map(|e| e.count), Some(2));
    }

    #[test]
    fn test_update_returning_none_leaves_entry() {
        let store = MemoryStore::new();
        store.update("k", &mut |_| Some(CounterEntry::fresh(0, 1_000)));

        let after = store.update("k", &mut |_| None);
        assert_eq!(after, Some(CounterEntry::fresh(0, 1_000)));

        let missing = store.update("other", &mut |_| None);
        assert_eq!(missing, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_expired() {
        let store = MemoryStore::new();
        store.update("old", &mut |_| Some(CounterEntry::fresh(0, 1_000)));
        store.update("new", &mut |_| Some(CounterEntry::fresh(0, 5_000)));

        assert_eq!(store.remove_expired(1_000), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());

        store.clear();
        assert!(store.is_empty());
    }
}
