//! In-process window store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{AtomicWindowStore, StoreError, WindowSnapshot};

/// One recorded import inside a window key.
#[derive(Debug, Clone)]
struct StoredEntry {
    score_ms: i64,
    member: String,
}

/// One window key: its entries and its expiry deadline.
#[derive(Debug, Default)]
struct WindowSet {
    entries: Vec<StoredEntry>,
    expires_at_ms: Option<i64>,
}

impl WindowSet {
    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(deadline) if deadline <= now_ms)
    }
}

/// In-memory implementation of [`AtomicWindowStore`] for tests and
/// single-process deployments.
///
/// Mirrors the Redis-backed store's semantics: keys expire lazily against the
/// caller's clock, a key whose last entry is pruned disappears, and re-adding
/// an existing member moves its score instead of duplicating it. The map's
/// per-key entry guard stands in for the server-side script: no concurrent
/// caller can observe a key between the prune and the count.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    sets: DashMap<String, WindowSet>,
}

impl MemoryWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live window keys, ignoring pending expiry.
    ///
    /// This is primarily useful for testing.
    pub fn key_count(&self) -> usize {
        self.sets.len()
    }
}

#[async_trait]
impl AtomicWindowStore for MemoryWindowStore {
    async fn evict_and_count(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        window_ms: i64,
    ) -> Result<WindowSnapshot, StoreError> {
        const EMPTY: WindowSnapshot = WindowSnapshot {
            count: 0,
            oldest_score_ms: None,
        };

        match self.sets.entry(key.to_owned()) {
            Entry::Vacant(_) => Ok(EMPTY),
            Entry::Occupied(mut occupied) => {
                let set = occupied.get_mut();
                if set.is_expired(now_ms) {
                    occupied.remove();
                    return Ok(EMPTY);
                }

                set.entries.retain(|entry| entry.score_ms >= window_start_ms);
                if set.entries.is_empty() {
                    // An ordered set with no members does not exist.
                    occupied.remove();
                    return Ok(EMPTY);
                }

                let count = set.entries.len() as u64;
                let oldest_score_ms = set.entries.iter().map(|entry| entry.score_ms).min();
                set.expires_at_ms = Some(now_ms + window_ms);

                Ok(WindowSnapshot {
                    count,
                    oldest_score_ms,
                })
            }
        }
    }

    async fn add_entry(
        &self,
        key: &str,
        score_ms: i64,
        member: &str,
        ttl_ms: i64,
    ) -> Result<(), StoreError> {
        let mut set = self.sets.entry(key.to_owned()).or_default();
        if set.is_expired(score_ms) {
            set.entries.clear();
        }

        match set.entries.iter_mut().find(|entry| entry.member == member) {
            Some(existing) => existing.score_ms = score_ms,
            None => set.entries.push(StoredEntry {
                score_ms,
                member: member.to_owned(),
            }),
        }
        set.expires_at_ms = Some(score_ms + ttl_ms);

        Ok(())
    }
}
