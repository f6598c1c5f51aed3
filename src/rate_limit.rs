use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use fleetbridge_backend::time::Clock;

/// Requests allowed per window per caller
pub const RATE_LIMIT_REQUESTS: u32 = 30;
/// Window length in seconds
pub const RATE_LIMIT_WINDOW_SECONDS: i64 = 60;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_seconds: i64 },
}

/// Fixed-window in-memory rate limiter keyed by caller identity.
///
/// Per-instance only: each runtime instance counts independently, which is
/// acceptable for an abuse guard. Buckets are `(request_count, window_start)`
/// pairs; a caller's window resets lazily on the first request after expiry.
pub struct RateLimiter {
    max_requests: u32,
    window_seconds: i64,
    buckets: Mutex<HashMap<String, (u32, i64)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter with the service's default limits
    pub fn with_default_limits() -> Self {
        Self::new(RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS)
    }

    /// Record a request from `caller` and decide whether it may proceed.
    pub fn check(&self, caller: &str, clock: &dyn Clock) -> RateDecision {
        let now = clock.now_epoch_seconds();
        let mut buckets = self.buckets.lock().unwrap();

        match buckets.get_mut(caller) {
            Some((count, window_start)) => {
                if now - *window_start > self.window_seconds {
                    // Window expired, start a fresh one
                    *count = 1;
                    *window_start = now;
                    return RateDecision::Allowed;
                }

                if *count >= self.max_requests {
                    let retry_after_seconds = self.window_seconds - (now - *window_start);
                    warn!(
                        caller,
                        count = *count,
                        window_start = *window_start,
                        "rate limit exceeded"
                    );
                    return RateDecision::Limited {
                        retry_after_seconds,
                    };
                }

                *count += 1;
                RateDecision::Allowed
            }
            None => {
                buckets.insert(caller.to_string(), (1, now));
                RateDecision::Allowed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetbridge_backend::time::FixedClock;

    #[test]
    fn test_requests_under_limit_allowed() {
        let limiter = RateLimiter::new(3, 60);
        let clock = FixedClock::from_rfc3339("2024-01-15T10:30:00Z").unwrap();

        for _ in 0..3 {
            assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
        }
    }

    #[test]
    fn test_request_over_limit_rejected_with_retry_hint() {
        let limiter = RateLimiter::new(2, 60);
        let mut clock = FixedClock::from_rfc3339("2024-01-15T10:30:00Z").unwrap();

        assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
        assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);

        clock.advance_seconds(10);
        assert_eq!(
            limiter.check("1.2.3.4", &clock),
            RateDecision::Limited {
                retry_after_seconds: 50
            }
        );
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let limiter = RateLimiter::new(1, 60);
        let mut clock = FixedClock::from_rfc3339("2024-01-15T10:30:00Z").unwrap();

        assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
        assert!(matches!(
            limiter.check("1.2.3.4", &clock),
            RateDecision::Limited { .. }
        ));

        clock.advance_seconds(61);
        assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
    }

    #[test]
    fn test_callers_are_counted_independently() {
        let limiter = RateLimiter::new(1, 60);
        let clock = FixedClock::from_rfc3339("2024-01-15T10:30:00Z").unwrap();

        assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
        assert_eq!(limiter.check("5.6.7.8", &clock), RateDecision::Allowed);
        assert!(matches!(
            limiter.check("1.2.3.4", &clock),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_default_limits() {
        let limiter = RateLimiter::with_default_limits();
        let clock = FixedClock::from_rfc3339("2024-01-15T10:30:00Z").unwrap();

        for _ in 0..RATE_LIMIT_REQUESTS {
            assert_eq!(limiter.check("1.2.3.4", &clock), RateDecision::Allowed);
        }
        assert!(matches!(
            limiter.check("1.2.3.4", &clock),
            RateDecision::Limited { .. }
        ));
    }
}
