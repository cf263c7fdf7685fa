//! Inter-query delay policies.
//!
//! Search endpoints throttle bursts, so the valuator pauses between
//! queries. The pause length comes from an injected policy: jittered in
//! production, fixed (usually zero) in tests.

use rand::Rng;
use std::time::Duration;

use crate::config::PolitenessConfig;

pub trait DelayPolicy: Send + Sync {
    /// How long to wait before the next query.
    fn next_delay(&self) -> Duration;
}

/// Uniformly random delay in `[min, max]`.
#[derive(Debug, Clone)]
pub struct JitterDelay {
    min: Duration,
    max: Duration,
}

impl JitterDelay {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(cfg: &PolitenessConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.min_delay_ms),
            Duration::from_millis(cfg.max_delay_ms),
        )
    }
}

impl DelayPolicy for JitterDelay {
    fn next_delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Always the same delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn none() -> Self {
        Self(Duration::ZERO)
    }
}

impl DelayPolicy for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}
