// Tests for crawl admission control

use std::sync::Arc;
use std::time::Duration;
use tomograph_core::error::RateLimitError;
use tomograph_core::rate_limit::RateLimiter;

// ============================================================================
// Sliding Window Tests
// ============================================================================

#[test]
fn test_requests_within_window_are_admitted() {
    let limiter = Arc::new(RateLimiter::new(3, 10));

    for _ in 0..3 {
        let permit = limiter.acquire("client-a");
        assert!(permit.is_ok());
    }
    assert_eq!(limiter.active_scans(), 0);
}

#[test]
fn test_request_over_window_limit_is_denied() {
    let limiter = Arc::new(RateLimiter::new(2, 10));

    drop(limiter.acquire("client-a").unwrap());
    drop(limiter.acquire("client-a").unwrap());

    match limiter.acquire("client-a") {
        Err(RateLimitError::TooManyRequests { retry_after_secs }) => {
            assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
        }
        other => panic!("expected a window denial, got {:?}", other),
    }
}

#[test]
fn test_window_is_per_client() {
    let limiter = Arc::new(RateLimiter::new(1, 10));

    drop(limiter.acquire("client-a").unwrap());
    assert!(limiter.acquire("client-a").is_err());
    assert!(limiter.acquire("client-b").is_ok());
}

#[test]
fn test_window_expires() {
    let limiter = Arc::new(RateLimiter::new(1, 10).with_window(Duration::from_millis(50)));

    drop(limiter.acquire("client-a").unwrap());
    assert!(limiter.acquire("client-a").is_err());

    std::thread::sleep(Duration::from_millis(80));
    assert!(limiter.acquire("client-a").is_ok());
}

#[test]
fn test_denial_message_mentions_wait() {
    let err = RateLimitError::TooManyRequests { retry_after_secs: 42 };
    assert!(err.to_string().contains("42 seconds"));
}

// ============================================================================
// Concurrency Cap Tests
// ============================================================================

#[test]
fn test_concurrency_cap_denies_when_full() {
    let limiter = Arc::new(RateLimiter::new(100, 2));

    let first = limiter.acquire("a").unwrap();
    let _second = limiter.acquire("b").unwrap();
    assert_eq!(limiter.active_scans(), 2);
    assert_eq!(limiter.acquire("c").unwrap_err(), RateLimitError::Busy);

    drop(first);
    assert_eq!(limiter.active_scans(), 1);
    assert!(limiter.acquire("c").is_ok());
}

#[test]
fn test_busy_denial_does_not_consume_window() {
    let limiter = Arc::new(RateLimiter::new(1, 1));

    let held = limiter.acquire("a").unwrap();
    assert_eq!(limiter.acquire("b").unwrap_err(), RateLimitError::Busy);
    drop(held);

    // "b" was never recorded, so its single slot is still free
    assert!(limiter.acquire("b").is_ok());
}

#[test]
fn test_permit_released_exactly_once() {
    let limiter = Arc::new(RateLimiter::new(10, 5));

    let permit = limiter.acquire("a").unwrap();
    assert_eq!(permit.client(), "a");
    assert_eq!(limiter.active_scans(), 1);
    drop(permit);
    assert_eq!(limiter.active_scans(), 0);

    // A fresh permit after release does not underflow the counter
    drop(limiter.acquire("a").unwrap());
    assert_eq!(limiter.active_scans(), 0);
}

#[test]
fn test_permit_released_on_panic() {
    let limiter = Arc::new(RateLimiter::new(10, 1));

    let cloned = Arc::clone(&limiter);
    let result = std::thread::spawn(move || {
        let _permit = cloned.acquire("a").unwrap();
        panic!("crawl blew up");
    })
    .join();

    assert!(result.is_err());
    assert_eq!(limiter.active_scans(), 0);
    assert!(limiter.acquire("b").is_ok());
}

// ============================================================================
// Cleanup Tests
// ============================================================================

#[test]
fn test_expired_clients_are_purged() {
    let limiter = Arc::new(
        RateLimiter::new(5, 10)
            .with_window(Duration::from_millis(20))
            .with_cleanup_interval(Duration::from_millis(20)),
    );

    drop(limiter.acquire("a").unwrap());
    drop(limiter.acquire("b").unwrap());
    assert_eq!(limiter.tracked_clients(), 2);

    std::thread::sleep(Duration::from_millis(50));
    drop(limiter.acquire("c").unwrap());
    assert_eq!(limiter.tracked_clients(), 1);
}
