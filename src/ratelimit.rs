use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

// Matches the remote's tolerance we observed: one file every five seconds.
const DEFAULT_BURST: NonZeroU32 = nonzero!(1u32);
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

/// How many transfers may start per `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub burst: NonZeroU32,
    pub interval: Duration,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            burst: DEFAULT_BURST,
            interval: DEFAULT_COOLDOWN,
        }
    }
}

impl RatePolicy {
    pub fn new(burst: NonZeroU32, interval: Duration) -> Self {
        Self { burst, interval }
    }

    /// No cooldown at all.
    pub fn unlimited() -> Self {
        Self {
            burst: DEFAULT_BURST,
            interval: Duration::ZERO,
        }
    }
}

/// The transfer cooldown. Every item waits here before touching the network,
/// so the first item goes straight through and later ones are spaced out.
pub struct RateLimiter {
    // None when the policy interval is zero.
    per_interval: Option<SpecificGovernorRateLimiter>,
}

impl RateLimiter {
    pub fn new(policy: RatePolicy) -> Self {
        // `burst` cells replenish one every interval / burst.
        let per_interval = Quota::with_period(policy.interval / policy.burst.get())
            .map(|quota| GovernorRateLimiter::direct(quota.allow_burst(policy.burst)));
        RateLimiter { per_interval }
    }

    pub async fn wait_until_ready(&self) {
        if let Some(limiter) = &self.per_interval {
            if limiter.check().is_err() {
                log::info!("Cooling down...");
                limiter.until_ready().await;
            }
        }
    }
}
