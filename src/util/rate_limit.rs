//! Login attempt throttling

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tracing::warn;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Process-wide cap on login attempts per second. A rate of zero is treated as one.
#[derive(Clone)]
pub struct LoginThrottle {
    limiter: Arc<Limiter>,
}

impl LoginThrottle {
    pub fn new(attempts_per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(attempts_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Take one attempt from the budget; false when exhausted
    pub fn allow(&self) -> bool {
        let allowed = self.limiter.check().is_ok();
        if !allowed {
            warn!("Login attempt throttled");
        }
        allowed
    }
}
