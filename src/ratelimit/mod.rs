//! Rate limiting logic for wallet transaction imports.

mod limiter;
mod window;
mod dimension;
mod result;

pub use limiter::ImportRateLimiter;
pub use window::{SlidingWindowCounter, WindowStatus};
pub use dimension::{LimitDimension, IN_PRIORITY_ORDER};
pub use result::RateLimitResult;
