//! Core rate limiter implementation.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::RateLimitConfig;
use crate::error::Result;
use crate::store::AtomicWindowStore;

use super::dimension::{LimitDimension, IN_PRIORITY_ORDER};
use super::result::RateLimitResult;
use super::window::{SlidingWindowCounter, WindowStatus};

/// The core rate limiter that evaluates imports across every dimension.
///
/// Holds no counts of its own; all state lives in the shared store, so the
/// same limits hold across every process pointed at that store. Safe to
/// share across tasks.
pub struct ImportRateLimiter<S> {
    /// Counters in evaluation order: user, then client address, then wallet
    dimensions: Vec<(LimitDimension, SlidingWindowCounter<S>)>,
}

impl<S: AtomicWindowStore> ImportRateLimiter<S> {
    /// Create a limiter enforcing `config` against `store`.
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        let dimensions = IN_PRIORITY_ORDER
            .into_iter()
            .map(|dimension| {
                let limit = match dimension {
                    LimitDimension::User => config.user.clone(),
                    LimitDimension::Ip => config.ip.clone(),
                    LimitDimension::Wallet => config.wallet.clone(),
                };
                (
                    dimension,
                    SlidingWindowCounter::new(Arc::clone(&store), limit),
                )
            })
            .collect();

        Self { dimensions }
    }

    /// Evaluate one import attempt against every dimension, in priority
    /// order, and report the first exhausted dimension if any.
    ///
    /// Checking consumes no quota. Once the gated operation succeeds, the
    /// caller records it with `increment_counters`; between those two steps
    /// concurrent requests may read the same count, so a burst can briefly
    /// overshoot a limit by the number of in-flight requests.
    ///
    /// A store failure comes back as an error, never as an allowed result.
    pub async fn check_rate_limit(
        &self,
        user_id: &str,
        ip: &str,
        wallet_id: &str,
    ) -> Result<RateLimitResult> {
        trace!(
            user_id = %user_id,
            ip = %ip,
            wallet_id = %wallet_id,
            "Checking import rate limit"
        );

        let mut statuses: Vec<WindowStatus> = Vec::with_capacity(self.dimensions.len());

        for (dimension, counter) in &self.dimensions {
            let identifier = Self::identifier(*dimension, user_id, ip, wallet_id);
            let status = counter.check(identifier).await?;

            if status.count >= u64::from(counter.limit().max_count) {
                debug!(
                    dimension = %dimension,
                    count = status.count,
                    limit = counter.limit().max_count,
                    "Import rate limit exceeded"
                );
                return Ok(RateLimitResult::denied(*dimension, counter.limit(), &status));
            }

            statuses.push(status);
        }

        // Every dimension has headroom; report from the first one checked.
        let (dimension, counter) = &self.dimensions[0];
        Ok(RateLimitResult::allowed(
            *dimension,
            counter.limit(),
            &statuses[0],
        ))
    }

    /// Record a successful import against every dimension.
    ///
    /// Not transactional: a failure part-way leaves the earlier dimensions
    /// counted and the later ones not. The error is surfaced so the caller
    /// can log it, but nothing is rolled back.
    pub async fn increment_counters(
        &self,
        user_id: &str,
        ip: &str,
        wallet_id: &str,
    ) -> Result<()> {
        for (dimension, counter) in &self.dimensions {
            let identifier = Self::identifier(*dimension, user_id, ip, wallet_id);
            if let Err(e) = counter.increment(identifier).await {
                warn!(
                    dimension = %dimension,
                    error = %e,
                    "Failed to record import; earlier dimensions remain counted"
                );
                return Err(e);
            }
        }

        Ok(())
    }

    fn identifier<'a>(
        dimension: LimitDimension,
        user_id: &'a str,
        ip: &'a str,
        wallet_id: &'a str,
    ) -> &'a str {
        match dimension {
            LimitDimension::User => user_id,
            LimitDimension::Ip => ip,
            LimitDimension::Wallet => wallet_id,
        }
    }
}
