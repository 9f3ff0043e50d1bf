//! Rate limit decisions as reported to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DimensionLimit;

use super::dimension::LimitDimension;
use super::window::WindowStatus;

/// Outcome of evaluating one import against every dimension.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitResult {
    /// Whether the import may proceed
    pub allowed: bool,
    /// The dimension this result reports on
    pub limit_type: LimitDimension,
    /// Maximum imports the reported dimension admits per window
    pub limit: u32,
    /// Imports left in the reported dimension's window, after this one
    pub remaining: u32,
    /// When the window pressure next eases
    pub reset_at: DateTime<Utc>,
    /// Seconds to wait before retrying; zero when allowed
    pub retry_after_secs: u64,
    /// Human-readable denial reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RateLimitResult {
    /// Build the allowed outcome, reported against `dimension`.
    ///
    /// `remaining` is the headroom left once the import being admitted
    /// right now is counted.
    pub(crate) fn allowed(
        dimension: LimitDimension,
        limit: &DimensionLimit,
        status: &WindowStatus,
    ) -> Self {
        let remaining = u64::from(limit.max_count)
            .saturating_sub(status.count)
            .saturating_sub(1) as u32;
        let reset_ms = status.checked_at_ms + limit.window_ms();

        Self {
            allowed: true,
            limit_type: dimension,
            limit: limit.max_count,
            remaining,
            reset_at: timestamp_ms(reset_ms),
            retry_after_secs: 0,
            error_message: None,
        }
    }

    /// Build the denied outcome for the first exhausted `dimension`.
    ///
    /// The reset time is when the oldest surviving entry leaves the window;
    /// the retry hint rounds up and never advises less than one second.
    pub(crate) fn denied(
        dimension: LimitDimension,
        limit: &DimensionLimit,
        status: &WindowStatus,
    ) -> Self {
        let oldest_ms = status.oldest_entry_ms.unwrap_or(status.checked_at_ms);
        let reset_ms = oldest_ms + limit.window_ms();
        let wait_ms = (reset_ms - status.checked_at_ms).max(0) as u64;

        Self {
            allowed: false,
            limit_type: dimension,
            limit: limit.max_count,
            remaining: 0,
            reset_at: timestamp_ms(reset_ms),
            retry_after_secs: wait_ms.div_ceil(1000).max(1),
            error_message: Some(format!(
                "import rate limit exceeded for {}: at most {} imports allowed in the current window",
                dimension, limit.max_count
            )),
        }
    }
}

fn timestamp_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
