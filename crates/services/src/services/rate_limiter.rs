//! Sliding-window request limiter shared by every fetch path.

use std::time::{Duration, Instant};

/// Attempts allowed within one window before fetches are blocked
pub const MAX_ATTEMPTS_PER_WINDOW: u32 = 20;

/// Window length
pub const WINDOW: Duration = Duration::from_secs(60);

/// Counts fetch attempts in a sliding one-minute window.
///
/// Every attempt is counted, including ones that end up served from cache.
/// The clock is passed in so window expiry is testable without sleeping.
#[derive(Debug, Default)]
pub struct RateLimiter {
    count: u32,
    window_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt and report whether it must be blocked.
    ///
    /// The counter resets whenever more than [`WINDOW`] has elapsed since the
    /// window opened; the attempt that resets it counts as the first of the
    /// new window.
    pub fn check(&mut self, now: Instant) -> bool {
        match self.window_start {
            Some(start) if now.duration_since(start) > WINDOW => {
                self.window_start = Some(now);
                self.count = 0;
            }
            Some(_) => {}
            None => self.window_start = Some(now),
        }
        self.count += 1;
        self.count > MAX_ATTEMPTS_PER_WINDOW
    }

    /// Unconditionally clear the counter and window start
    pub fn reset(&mut self) {
        self.count = 0;
        self.window_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_ceiling_then_blocks() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        for _ in 0..MAX_ATTEMPTS_PER_WINDOW {
            assert!(!limiter.check(now));
        }
        assert!(limiter.check(now));
        assert!(limiter.check(now));
    }

    #[test]
    fn test_reset_reopens_the_window() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        for _ in 0..=MAX_ATTEMPTS_PER_WINDOW {
            limiter.check(now);
        }
        limiter.reset();
        assert!(!limiter.check(now));
    }

    #[test]
    fn test_window_expiry_resets_counter_to_one() {
        let mut limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..=MAX_ATTEMPTS_PER_WINDOW {
            limiter.check(t0);
        }
        // 61 seconds later the full window has lapsed; the next attempt is
        // attempt 1 of a fresh window, not attempt 22.
        let t1 = t0 + Duration::from_secs(61);
        assert!(!limiter.check(t1));
        for _ in 1..MAX_ATTEMPTS_PER_WINDOW {
            assert!(!limiter.check(t1));
        }
        assert!(limiter.check(t1));
    }

    #[test]
    fn test_window_does_not_expire_at_exactly_sixty_seconds() {
        let mut limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..=MAX_ATTEMPTS_PER_WINDOW {
            limiter.check(t0);
        }
        assert!(limiter.check(t0 + WINDOW));
    }
}
