//! Redis-backed window store.
//!
//! One sorted set per window key: score = entry timestamp in epoch
//! milliseconds, member = unique entry id. The prune/count/peek/expire unit
//! runs as a single server-side script so every concurrent caller sees one
//! consistent view of the window, with no locking in this process.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::{debug, trace};

use super::{AtomicWindowStore, StoreError, WindowSnapshot};

/// Atomic prune-count-peek-expire unit.
///
/// KEYS[1] window key; ARGV[1] window start (ms), ARGV[2] key TTL (ms).
/// Entries scored strictly below the window start are expired. The oldest
/// surviving score comes back alongside the count; `false` marks an empty
/// window (a nil inside a Lua table would truncate the reply).
const EVICT_AND_COUNT_SCRIPT: &str = r#"
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', '(' .. ARGV[1])
local count = redis.call('ZCARD', KEYS[1])
local oldest = false
if count > 0 then
    local head = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
    oldest = tonumber(head[2])
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return {count, oldest}
"#;

/// Redis implementation of [`AtomicWindowStore`].
///
/// Holds one multiplexed connection shared by every counter; the
/// serialization the limiter relies on happens server-side, inside the
/// script, never in this process.
pub struct RedisWindowStore {
    connection: ConnectionManager,
    evict_and_count: Script,
}

impl RedisWindowStore {
    /// Connect to the store at `url`, e.g. `redis://127.0.0.1:6379`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(connection_error)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(connection_error)?;

        debug!(url = %url, "Connected to window store");

        Ok(Self::with_connection(connection))
    }

    /// Wrap an already-established managed connection.
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            evict_and_count: Script::new(EVICT_AND_COUNT_SCRIPT),
        }
    }
}

#[async_trait]
impl AtomicWindowStore for RedisWindowStore {
    async fn evict_and_count(
        &self,
        key: &str,
        window_start_ms: i64,
        _now_ms: i64,
        window_ms: i64,
    ) -> Result<WindowSnapshot, StoreError> {
        let mut connection = self.connection.clone();
        let (count, oldest_score_ms): (u64, Option<i64>) = self
            .evict_and_count
            .key(key)
            .arg(window_start_ms)
            .arg(window_ms)
            .invoke_async(&mut connection)
            .await
            .map_err(store_error)?;

        trace!(key = %key, count = count, "Pruned and counted window");

        Ok(WindowSnapshot {
            count,
            oldest_score_ms,
        })
    }

    async fn add_entry(
        &self,
        key: &str,
        score_ms: i64,
        member: &str,
        ttl_ms: i64,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        // Add and expire travel as one pipeline; they need no atomicity with
        // concurrent checks.
        let _: () = redis::pipe()
            .zadd(key, member, score_ms)
            .ignore()
            .pexpire(key, ttl_ms)
            .ignore()
            .query_async(&mut connection)
            .await
            .map_err(store_error)?;

        trace!(key = %key, score_ms = score_ms, "Recorded window entry");

        Ok(())
    }
}

/// Classify a client error: connection-level trouble means the store is
/// unavailable, anything else means the operation itself failed.
fn store_error(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Script(e.to_string())
    }
}

fn connection_error(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_map_to_unavailable() {
        let err = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(matches!(store_error(err), StoreError::Unavailable(_)));
    }

    #[test]
    fn test_command_failures_map_to_script() {
        let err = redis::RedisError::from((redis::ErrorKind::ResponseError, "WRONGTYPE"));
        assert!(matches!(store_error(err), StoreError::Script(_)));
    }

    #[tokio::test]
    #[ignore = "needs a local Redis at 127.0.0.1:6379"]
    async fn test_window_round_trip_against_local_redis() {
        let store = RedisWindowStore::connect("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let key = format!("importgate:test:{}", uuid::Uuid::new_v4());
        let now_ms = chrono::Utc::now().timestamp_millis();

        store.add_entry(&key, now_ms, "m1", 120_000).await.unwrap();
        store.add_entry(&key, now_ms, "m2", 120_000).await.unwrap();

        let snapshot = store
            .evict_and_count(&key, now_ms - 60_000, now_ms, 60_000)
            .await
            .unwrap();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.oldest_score_ms, Some(now_ms));

        // A window start past the entries prunes the key away.
        let snapshot = store
            .evict_and_count(&key, now_ms + 1, now_ms + 60_001, 60_000)
            .await
            .unwrap();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.oldest_score_ms, None);
    }
}
