//! Per-client fixed-window rate limiting.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Operation class with an independent request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// Note retrievals.
    Read,
    /// Note creations.
    Write,
}

impl OpClass {
    /// Convert class to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OpClass::Read => "read",
            OpClass::Write => "write",
        }
    }
}

/// Request budgets per fixed window. A budget of 0 means unlimited.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub read_budget: u32,
    pub write_budget: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    fn budget(&self, class: OpClass) -> u32 {
        match class {
            OpClass::Read => self.read_budget,
            OpClass::Write => self.write_budget,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            read_budget: 120,
            write_budget: 30,
            window: Duration::from_secs(60),
        }
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by (client key, operation class).
///
/// Decisions are O(1) under a single short-lived lock, so concurrent callers
/// cannot lose updates. Counters reset at the window boundary. The limiter is
/// passed into request handling as an explicit dependency; there is no
/// process-wide singleton.
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    windows: Arc<Mutex<HashMap<(String, OpClass), Window>>>,
}

impl RateLimiter {
    /// Create a limiter with the given policy.
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns true when the caller still has budget for this operation
    /// class in the current window, consuming one unit on success.
    pub fn allow(&self, client_key: &str, class: OpClass) -> bool {
        let budget = self.policy.budget(class);
        if budget == 0 {
            return true;
        }

        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows
            .entry((client_key.to_owned(), class))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(window.started) >= self.policy.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= budget {
            warn!(
                client = client_key,
                class = class.as_str(),
                budget,
                "rate limit exceeded"
            );
            return false;
        }

        window.count += 1;
        true
    }

    /// Drops counters whose window elapsed, bounding memory for churn-heavy
    /// traffic. Called periodically from the maintenance loop.
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.policy.window);
        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(read: u32, write: u32, window_ms: u64) -> RateLimitPolicy {
        RateLimitPolicy {
            read_budget: read,
            write_budget: write,
            window: Duration::from_millis(window_ms),
        }
    }

    #[test]
    fn enforces_budget_within_window() {
        let limiter = RateLimiter::new(policy(3, 3, 60_000));
        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", OpClass::Read));
        }
        assert!(!limiter.allow("10.0.0.1", OpClass::Read));
    }

    #[test]
    fn classes_have_independent_budgets() {
        let limiter = RateLimiter::new(policy(1, 2, 60_000));
        assert!(limiter.allow("10.0.0.1", OpClass::Read));
        assert!(!limiter.allow("10.0.0.1", OpClass::Read));
        // Write budget untouched by read exhaustion.
        assert!(limiter.allow("10.0.0.1", OpClass::Write));
        assert!(limiter.allow("10.0.0.1", OpClass::Write));
        assert!(!limiter.allow("10.0.0.1", OpClass::Write));
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = RateLimiter::new(policy(1, 1, 60_000));
        assert!(limiter.allow("10.0.0.1", OpClass::Read));
        assert!(!limiter.allow("10.0.0.1", OpClass::Read));
        assert!(limiter.allow("10.0.0.2", OpClass::Read));
    }

    #[test]
    fn window_reset_restores_capacity() {
        let limiter = RateLimiter::new(policy(1, 1, 30));
        assert!(limiter.allow("10.0.0.1", OpClass::Read));
        assert!(!limiter.allow("10.0.0.1", OpClass::Read));
        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.allow("10.0.0.1", OpClass::Read));
    }

    #[test]
    fn zero_budget_is_unlimited() {
        let limiter = RateLimiter::new(policy(0, 0, 1));
        for _ in 0..1000 {
            assert!(limiter.allow("10.0.0.1", OpClass::Read));
            assert!(limiter.allow("10.0.0.1", OpClass::Write));
        }
    }

    #[test]
    fn purge_drops_only_elapsed_windows() {
        let limiter = RateLimiter::new(policy(5, 5, 30));
        limiter.allow("stale", OpClass::Read);
        std::thread::sleep(Duration::from_millis(40));
        limiter.allow("fresh", OpClass::Read);
        assert_eq!(limiter.purge_stale(), 1);
        // Fresh window survives with its count intact.
        for _ in 0..4 {
            assert!(limiter.allow("fresh", OpClass::Read));
        }
        assert!(!limiter.allow("fresh", OpClass::Read));
    }

    #[test]
    fn concurrent_callers_never_exceed_budget() {
        let limiter = RateLimiter::new(policy(0, 50, 60_000));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || {
                let mut granted = 0u32;
                for _ in 0..25 {
                    if limiter.allow("shared", OpClass::Write) {
                        granted += 1;
                    }
                }
                granted
            }));
        }
        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50);
    }
}
