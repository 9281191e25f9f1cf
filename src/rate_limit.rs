//! In-memory rate limiting for agent requests.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<IpAddr, VecDeque<Instant>>`.
//! Three limits enforced, keyed by the caller's address:
//! - Per-client: 30 agent requests/min
//! - Global: 120 LLM-backed requests/min
//! - Token budget: 200k tokens/client/hour
//!
//! Token usage is recorded after each LLM call, so a burst of concurrent
//! requests can overshoot the budget by at most the in-flight calls.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::parse_or;

const DEFAULT_PER_CLIENT_LIMIT: usize = 30;
const DEFAULT_PER_CLIENT_WINDOW_SECS: u64 = 60;

const DEFAULT_GLOBAL_LIMIT: usize = 120;
const DEFAULT_GLOBAL_WINDOW_SECS: u64 = 60;

const DEFAULT_TOKEN_BUDGET: u64 = 200_000;
const DEFAULT_TOKEN_WINDOW_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_client_limit: usize,
    pub per_client_window: Duration,
    pub global_limit: usize,
    pub global_window: Duration,
    pub token_budget: u64,
    pub token_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_client_limit: DEFAULT_PER_CLIENT_LIMIT,
            per_client_window: Duration::from_secs(DEFAULT_PER_CLIENT_WINDOW_SECS),
            global_limit: DEFAULT_GLOBAL_LIMIT,
            global_window: Duration::from_secs(DEFAULT_GLOBAL_WINDOW_SECS),
            token_budget: DEFAULT_TOKEN_BUDGET,
            token_window: Duration::from_secs(DEFAULT_TOKEN_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| Duration::from_secs(parse_or(lookup(key), default));
        Self {
            per_client_limit: parse_or(lookup("RATE_LIMIT_PER_CLIENT"), DEFAULT_PER_CLIENT_LIMIT),
            per_client_window: secs("RATE_LIMIT_PER_CLIENT_WINDOW_SECS", DEFAULT_PER_CLIENT_WINDOW_SECS),
            global_limit: parse_or(lookup("RATE_LIMIT_GLOBAL"), DEFAULT_GLOBAL_LIMIT),
            global_window: secs("RATE_LIMIT_GLOBAL_WINDOW_SECS", DEFAULT_GLOBAL_WINDOW_SECS),
            token_budget: parse_or(lookup("RATE_LIMIT_TOKEN_BUDGET"), DEFAULT_TOKEN_BUDGET),
            token_window: secs("RATE_LIMIT_TOKEN_WINDOW_SECS", DEFAULT_TOKEN_WINDOW_SECS),
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RateLimitError {
    #[error("per-client rate limit exceeded (max {limit} requests/{window_secs}s)")]
    PerClientExceeded { limit: usize, window_secs: u64 },
    #[error("global rate limit exceeded (max {limit} requests/{window_secs}s)")]
    GlobalExceeded { limit: usize, window_secs: u64 },
    #[error("token budget exceeded (max {budget} tokens/{window_secs}s)")]
    TokenBudgetExceeded { budget: u64, window_secs: u64 },
}

impl crate::error::ErrorCode for RateLimitError {
    fn error_code(&self) -> &'static str {
        "E_RATE_LIMITED"
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

#[derive(Default)]
struct RateLimiterInner {
    /// Per-client request timestamps.
    client_requests: HashMap<IpAddr, VecDeque<Instant>>,
    /// Global request timestamps.
    global_requests: VecDeque<Instant>,
    /// Per-client token usage: (timestamp, `token_count`).
    client_tokens: HashMap<IpAddr, VecDeque<(Instant, u64)>>,
}

impl RateLimiterInner {
    /// Prune every client window and drop the ones left empty. Client keys
    /// are peer addresses, so idle entries must not outlive their window.
    fn evict_idle(&mut self, now: Instant, cfg: &RateLimitConfig) {
        self.client_requests.retain(|_, deque| {
            prune_window(deque, now, cfg.per_client_window);
            !deque.is_empty()
        });
        self.client_tokens.retain(|_, deque| {
            prune_token_window(deque, now, cfg.token_window);
            !deque.is_empty()
        });
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(RateLimiterInner::default())), config }
    }

    /// Check both per-client and global rate limits, then record the request.
    ///
    /// # Errors
    ///
    /// Returns the first limit that would be exceeded; nothing is recorded then.
    pub fn check_and_record(&self, client: IpAddr) -> Result<(), RateLimitError> {
        self.check_and_record_at(client, Instant::now())
    }

    fn check_and_record_at(&self, client: IpAddr, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;
        inner.evict_idle(now, &cfg);

        prune_window(&mut inner.global_requests, now, cfg.global_window);
        if inner.global_requests.len() >= cfg.global_limit {
            return Err(RateLimitError::GlobalExceeded {
                limit: cfg.global_limit,
                window_secs: cfg.global_window.as_secs(),
            });
        }

        let client_count = inner.client_requests.get(&client).map_or(0, VecDeque::len);
        if client_count >= cfg.per_client_limit {
            return Err(RateLimitError::PerClientExceeded {
                limit: cfg.per_client_limit,
                window_secs: cfg.per_client_window.as_secs(),
            });
        }

        inner.client_requests.entry(client).or_default().push_back(now);
        inner.global_requests.push_back(now);

        Ok(())
    }

    /// Check if the client's token budget allows another request.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::TokenBudgetExceeded`] once usage in the
    /// window reaches the budget.
    pub fn check_token_budget(&self, client: IpAddr) -> Result<(), RateLimitError> {
        self.check_token_budget_at(client, Instant::now())
    }

    fn check_token_budget_at(&self, client: IpAddr, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;
        // Unknown clients have used nothing; don't create an entry for them.
        let used: u64 = inner.client_tokens.get_mut(&client).map_or(0, |deque| {
            prune_token_window(deque, now, cfg.token_window);
            deque.iter().map(|(_, t)| t).sum()
        });
        if used >= cfg.token_budget {
            return Err(RateLimitError::TokenBudgetExceeded {
                budget: cfg.token_budget,
                window_secs: cfg.token_window.as_secs(),
            });
        }
        Ok(())
    }

    /// Record token usage after an LLM response.
    pub fn record_tokens(&self, client: IpAddr, tokens: u64) {
        self.record_tokens_at(client, tokens, Instant::now());
    }

    fn record_tokens_at(&self, client: IpAddr, tokens: u64, now: Instant) {
        if tokens == 0 {
            return;
        }
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let token_deque = inner.client_tokens.entry(client).or_default();
        prune_token_window(token_deque, now, self.config.token_window);
        token_deque.push_back((now, tokens));
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

fn prune_token_window(deque: &mut VecDeque<(Instant, u64)>, now: Instant, window: Duration) {
    while let Some(&(front, _)) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
