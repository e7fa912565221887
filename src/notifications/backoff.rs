//! Reconnection backoff policy
//!
//! Exponential delay with a ceiling, plus random jitter so a fleet of
//! clients does not reconnect in lockstep after a shared outage.

use std::time::Duration;

use rand::Rng;

use crate::config::ClientConfig;

/// Capped exponential backoff with jitter
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter_max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter_max: Duration) -> Self {
        Self {
            base,
            max,
            jitter_max,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.backoff_base,
            config.backoff_max,
            config.backoff_jitter_max,
        )
    }

    /// Deterministic part of the delay: `min(max, base * 2^attempt)`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay before retrying the given zero-based attempt, jitter included
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter_max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff_no_jitter() -> Backoff {
        Backoff::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_doubles_per_attempt() {
        let backoff = backoff_no_jitter();
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_caps_at_max() {
        let backoff = backoff_no_jitter();
        assert_eq!(backoff.delay(20), Duration::from_secs(30));
        // Large attempt numbers must not overflow.
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = Backoff::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            Duration::from_millis(50),
        );
        for attempt in 0..16 {
            let delay = backoff.delay(attempt);
            assert!(delay >= backoff.base_delay(attempt));
            assert!(delay <= backoff.base_delay(attempt) + Duration::from_millis(50));
        }
    }
}
