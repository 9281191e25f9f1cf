use std::net::Ipv4Addr;

use super::*;

fn client(n: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, n))
}

fn small_config() -> RateLimitConfig {
    RateLimitConfig {
        per_client_limit: 3,
        per_client_window: Duration::from_secs(60),
        global_limit: 5,
        global_window: Duration::from_secs(60),
        token_budget: 100,
        token_window: Duration::from_secs(3600),
    }
}

#[test]
fn per_client_allows_up_to_limit() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    for i in 0..3 {
        assert!(rl.check_and_record_at(client(1), now).is_ok(), "request {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at(client(1), now),
        Err(RateLimitError::PerClientExceeded { limit: 3, window_secs: 60 })
    ));
}

#[test]
fn global_allows_up_to_limit() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    // Distinct clients so the per-client limit never trips first.
    for n in 0..5 {
        assert!(rl.check_and_record_at(client(n), now).is_ok(), "request {n} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at(client(99), now),
        Err(RateLimitError::GlobalExceeded { limit: 5, .. })
    ));
}

#[test]
fn window_expiry_allows_new_requests() {
    let rl = RateLimiter::new(small_config());
    let start = Instant::now();

    for _ in 0..3 {
        rl.check_and_record_at(client(1), start).unwrap();
    }
    assert!(rl.check_and_record_at(client(1), start).is_err());

    let after_window = start + Duration::from_secs(60) + Duration::from_millis(1);
    assert!(rl.check_and_record_at(client(1), after_window).is_ok());
}

#[test]
fn distinct_clients_do_not_interfere() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    for _ in 0..3 {
        rl.check_and_record_at(client(1), now).unwrap();
    }
    assert!(rl.check_and_record_at(client(1), now).is_err());
    assert!(rl.check_and_record_at(client(2), now).is_ok());
}

#[test]
fn rejected_request_is_not_recorded_globally() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    for _ in 0..3 {
        rl.check_and_record_at(client(1), now).unwrap();
    }
    // Per-client rejections must not eat global capacity.
    for _ in 0..10 {
        assert!(rl.check_and_record_at(client(1), now).is_err());
    }
    assert!(rl.check_and_record_at(client(2), now).is_ok());
    assert!(rl.check_and_record_at(client(3), now).is_ok());
}

#[test]
fn token_budget_exceeded() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    rl.record_tokens_at(client(1), 60, now);
    assert!(rl.check_token_budget_at(client(1), now).is_ok());

    rl.record_tokens_at(client(1), 40, now);
    assert!(matches!(
        rl.check_token_budget_at(client(1), now),
        Err(RateLimitError::TokenBudgetExceeded { budget: 100, window_secs: 3600 })
    ));
    assert!(rl.check_token_budget_at(client(2), now).is_ok());
}

#[test]
fn token_budget_resets_after_window() {
    let rl = RateLimiter::new(small_config());
    let start = Instant::now();

    rl.record_tokens_at(client(1), 500, start);
    assert!(rl.check_token_budget_at(client(1), start).is_err());

    let later = start + Duration::from_secs(3601);
    assert!(rl.check_token_budget_at(client(1), later).is_ok());
}

#[test]
fn token_budget_check_does_not_track_unknown_clients() {
    let rl = RateLimiter::new(small_config());
    let now = Instant::now();

    for n in 0..50 {
        assert!(rl.check_token_budget_at(client(n), now).is_ok());
    }
    let inner = rl.inner.lock().unwrap();
    assert!(inner.client_tokens.is_empty());
}

#[test]
fn idle_clients_are_evicted_after_their_windows() {
    let rl = RateLimiter::new(RateLimitConfig { global_limit: 10_000, ..small_config() });
    let start = Instant::now();

    for n in 0..1000u32 {
        let addr = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + n));
        rl.check_and_record_at(addr, start).unwrap();
        rl.record_tokens_at(addr, 1, start);
    }
    {
        let inner = rl.inner.lock().unwrap();
        assert_eq!(inner.client_requests.len(), 1000);
        assert_eq!(inner.client_tokens.len(), 1000);
    }

    let later = start + Duration::from_secs(100_000);
    rl.check_and_record_at(client(1), later).unwrap();

    let inner = rl.inner.lock().unwrap();
    assert_eq!(inner.client_requests.len(), 1);
    assert!(inner.client_requests.contains_key(&client(1)));
    assert!(inner.client_tokens.is_empty());
}

#[test]
fn active_clients_survive_eviction() {
    let rl = RateLimiter::new(small_config());
    let start = Instant::now();

    rl.check_and_record_at(client(1), start).unwrap();
    rl.record_tokens_at(client(1), 10, start);

    // Request window expired, token window still open.
    let later = start + Duration::from_secs(120);
    rl.check_and_record_at(client(2), later).unwrap();

    let inner = rl.inner.lock().unwrap();
    assert!(!inner.client_requests.contains_key(&client(1)));
    assert!(inner.client_tokens.contains_key(&client(1)));
}

#[test]
fn config_from_lookup_reads_overrides() {
    let cfg = RateLimitConfig::from_lookup(|key| match key {
        "RATE_LIMIT_PER_CLIENT" => Some("7".into()),
        "RATE_LIMIT_GLOBAL_WINDOW_SECS" => Some("15".into()),
        "RATE_LIMIT_TOKEN_BUDGET" => Some("junk".into()),
        _ => None,
    });
    assert_eq!(cfg.per_client_limit, 7);
    assert_eq!(cfg.global_window, Duration::from_secs(15));
    assert_eq!(cfg.token_budget, DEFAULT_TOKEN_BUDGET);
}

#[test]
fn rate_limit_errors_are_retryable() {
    use crate::error::ErrorCode;
    let err = RateLimitError::GlobalExceeded { limit: 1, window_secs: 1 };
    assert_eq!(err.error_code(), "E_RATE_LIMITED");
    assert!(err.retryable());
}
