//! Sliding window counting against the shared store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::trace;
use uuid::Uuid;

use crate::config::DimensionLimit;
use crate::error::Result;
use crate::store::AtomicWindowStore;

/// Extra key lifetime granted when recording an entry, over the window
/// length. Keeps a just-written entry from expiring before a later check
/// observes it.
const INCREMENT_TTL_BUFFER: Duration = Duration::from_secs(60);

/// What a window looked like at the moment it was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// Entries inside the window, after expired ones were pruned
    pub count: u64,
    /// Score of the oldest surviving entry, if any
    pub oldest_entry_ms: Option<i64>,
    /// When the check ran, in epoch milliseconds
    pub checked_at_ms: i64,
}

/// Counts events for one dimension over a sliding window.
///
/// The counter holds no local state; every question is answered by the
/// shared store, so any number of processes can count against the same
/// windows.
pub struct SlidingWindowCounter<S> {
    store: Arc<S>,
    limit: DimensionLimit,
}

impl<S: AtomicWindowStore> SlidingWindowCounter<S> {
    /// Create a counter for one dimension backed by `store`.
    pub fn new(store: Arc<S>, limit: DimensionLimit) -> Self {
        Self { store, limit }
    }

    /// The limit this counter enforces.
    pub fn limit(&self) -> &DimensionLimit {
        &self.limit
    }

    /// Prune expired entries for `identifier` and report what remains.
    ///
    /// Read-only from the caller's point of view: checking never consumes
    /// quota.
    pub async fn check(&self, identifier: &str) -> Result<WindowStatus> {
        let key = self.key(identifier);
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = self.limit.window_ms();

        let snapshot = self
            .store
            .evict_and_count(&key, now_ms - window_ms, now_ms, window_ms)
            .await?;

        trace!(key = %key, count = snapshot.count, "Checked window");

        Ok(WindowStatus {
            count: snapshot.count,
            oldest_entry_ms: snapshot.oldest_score_ms,
            checked_at_ms: now_ms,
        })
    }

    /// Record one event for `identifier` at the current time.
    ///
    /// The member id combines a nanosecond timestamp with a random UUID so
    /// that two imports landing on the same millisecond still count twice.
    pub async fn increment(&self, identifier: &str) -> Result<()> {
        let key = self.key(identifier);
        let now = Utc::now();
        let member = format!(
            "{}-{}",
            now.timestamp_nanos_opt().unwrap_or_default(),
            Uuid::new_v4()
        );
        let ttl_ms = self.limit.window_ms() + INCREMENT_TTL_BUFFER.as_millis() as i64;

        self.store
            .add_entry(&key, now.timestamp_millis(), &member, ttl_ms)
            .await?;

        trace!(key = %key, member = %member, "Recorded import");

        Ok(())
    }

    fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.limit.key_prefix, identifier)
    }
}
