use rand::Rng;
use std::time::Duration;

/// Exponential backoff with full-width jitter.
///
/// Attempt `n` (0-indexed) waits `base * 2^n` plus a uniform jitter in
/// `[0, base * 2^n)`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
}

impl ExponentialBackoff {
    pub const fn new(base: Duration) -> Self {
        Self { base }
    }

    /// The deterministic part of the delay for `attempt`.
    pub fn floor(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let floor = self.floor(attempt);
        let floor_ms = u64::try_from(floor.as_millis()).unwrap_or(u64::MAX);
        let jitter = if floor_ms > 0 {
            rand::thread_rng().gen_range(0..floor_ms)
        } else {
            0
        };
        floor.saturating_add(Duration::from_millis(jitter))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_growth() {
        let backoff = ExponentialBackoff::default();
        assert_eq!(backoff.floor(0), Duration::from_secs(1));
        assert_eq!(backoff.floor(1), Duration::from_secs(2));
        assert_eq!(backoff.floor(2), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_stays_below_double_floor() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100));
        for attempt in 0..4 {
            let floor = backoff.floor(attempt);
            for _ in 0..50 {
                let delay = backoff.delay(attempt);
                assert!(delay >= floor);
                assert!(delay < floor * 2);
            }
        }
    }

    #[test]
    fn test_zero_base_means_no_wait() {
        let backoff = ExponentialBackoff::new(Duration::ZERO);
        assert_eq!(backoff.delay(3), Duration::ZERO);
    }

    #[test]
    fn test_huge_base_does_not_overflow() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(u64::MAX));
        assert_eq!(backoff.delay(3), Duration::MAX);
    }

    #[test]
    fn test_large_attempt_saturates() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(1));
        assert_eq!(backoff.floor(40), backoff.floor(16));
    }
}
