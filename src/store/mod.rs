//! Shared window store boundary.
//!
//! The limiter holds no counters of its own: every window entry lives in an
//! external, shared, atomically scriptable ordered-set store so that any
//! number of processes can evaluate the same limits concurrently. This module
//! defines the narrow contract the limiter consumes, plus the two
//! implementations shipped with the crate.

mod memory;
mod redis;

pub use self::memory::MemoryWindowStore;
pub use self::redis::RedisWindowStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a window store.
///
/// Neither variant may be read as an allow or a deny; callers fail closed and
/// surface the error as an internal failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("window store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but the atomic operation failed or replied with
    /// something unexpected.
    #[error("window store script failed: {0}")]
    Script(String),
}

/// Snapshot of one window key after expired entries were pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Entries still inside the window.
    pub count: u64,
    /// Score of the oldest surviving entry (epoch milliseconds), if any.
    pub oldest_score_ms: Option<i64>,
}

/// An external, shared, atomically scriptable ordered-set store.
///
/// One key holds one window: an ordered set of (score = entry timestamp in
/// epoch milliseconds, member = unique id) pairs. Implementations must make
/// `evict_and_count` a single indivisible unit per key; `add_entry` may be
/// pipelined and needs no atomicity with concurrent checks.
#[async_trait]
pub trait AtomicWindowStore: Send + Sync {
    /// Atomically remove all entries scored strictly below `window_start_ms`,
    /// count the survivors and report the lowest surviving score. When the
    /// key is non-empty its expiry is refreshed to `window_ms`, so a key that
    /// goes idle eventually vanishes without another call touching it.
    ///
    /// `now_ms` is the caller's clock; implementations without a clock of
    /// their own use it to evaluate key expiry.
    async fn evict_and_count(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        window_ms: i64,
    ) -> Result<WindowSnapshot, StoreError>;

    /// Append one entry at `score_ms` with a member unique across all
    /// concurrent callers, then refresh the key expiry to `ttl_ms` (measured
    /// from the entry's score).
    async fn add_entry(
        &self,
        key: &str,
        score_ms: i64,
        member: &str,
        ttl_ms: i64,
    ) -> Result<(), StoreError>;
}
