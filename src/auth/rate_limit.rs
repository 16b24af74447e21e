use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Fallback window when `now + window` does not fit in an `Instant`
const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Counter state for one rate-limit key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounter {
    pub count: u32,
    pub reset_at: Instant,
}

/// Backing storage for rate-limit counters.
///
/// `hit` must be atomic per key: start a fresh window (count 1) when the key is
/// unknown or its window has passed, otherwise increment, and return the result.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn hit(&self, key: &str, window: Duration, now: Instant) -> WindowCounter;

    /// Drop counters whose window has passed. Returns how many were removed.
    async fn prune(&self, now: Instant) -> usize;
}

/// Process-local counters. Not shared between instances and lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn hit(&self, key: &str, window: Duration, now: Instant) -> WindowCounter {
        // Windows too long for `Instant` are capped
        let reset_at = now.checked_add(window).unwrap_or(now + MAX_WINDOW);
        let mut counters = self.counters.lock().await;
        let counter = counters
            .entry(key.to_string())
            .and_modify(|c| {
                if now > c.reset_at {
                    *c = WindowCounter { count: 1, reset_at };
                } else {
                    c.count = c.count.saturating_add(1);
                }
            })
            .or_insert(WindowCounter { count: 1, reset_at });
        *counter
    }

    async fn prune(&self, now: Instant) -> usize {
        let mut counters = self.counters.lock().await;
        let before = counters.len();
        counters.retain(|_, c| now <= c.reset_at);
        before - counters.len()
    }
}

/// Fixed-window rate limiter.
///
/// Requests that straddle a window boundary can reach twice the limit in a
/// short burst; this is accepted for login throttling.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()))
    }

    /// Returns true if the request identified by `identifier` is allowed
    pub async fn check(&self, identifier: &str, max_requests: u32, window: Duration) -> bool {
        self.check_at(identifier, max_requests, window, Instant::now()).await
    }

    pub async fn check_at(
        &self,
        identifier: &str,
        max_requests: u32,
        window: Duration,
        now: Instant,
    ) -> bool {
        let counter = self.store.hit(identifier, window, now).await;
        let allowed = counter.count <= max_requests;
        if !allowed {
            tracing::warn!("Rate limit exceeded for {}", identifier);
        }
        allowed
    }

    pub async fn prune(&self) -> usize {
        self.store.prune(Instant::now()).await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn allows_up_to_max_then_rejects_until_window_resets() {
        let limiter = RateLimiter::in_memory();
        let start = Instant::now();

        for i in 0..3 {
            let now = start + Duration::from_secs(i);
            assert!(limiter.check_at("signin:10.0.0.1", 3, WINDOW, now).await);
        }
        assert!(!limiter.check_at("signin:10.0.0.1", 3, WINDOW, start + Duration::from_secs(5)).await);

        let after_window = start + WINDOW + Duration::from_secs(1);
        assert!(limiter.check_at("signin:10.0.0.1", 3, WINDOW, after_window).await);
    }

    #[tokio::test]
    async fn fresh_window_restarts_count_at_one() {
        let store = Arc::new(InMemoryCounterStore::new());
        let start = Instant::now();

        for _ in 0..5 {
            store.hit("k", WINDOW, start).await;
        }
        let restarted = store.hit("k", WINDOW, start + WINDOW + Duration::from_millis(1)).await;
        assert_eq!(restarted.count, 1);
        assert_eq!(restarted.reset_at, start + WINDOW + Duration::from_millis(1) + WINDOW);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::in_memory();
        let now = Instant::now();

        assert!(limiter.check_at("signin:a", 1, WINDOW, now).await);
        assert!(!limiter.check_at("signin:a", 1, WINDOW, now).await);
        assert!(limiter.check_at("signin:b", 1, WINDOW, now).await);
        assert!(limiter.check_at("signup:a", 1, WINDOW, now).await);
    }

    #[tokio::test]
    async fn oversized_window_is_capped_instead_of_overflowing() {
        let limiter = RateLimiter::in_memory();
        let now = Instant::now();

        assert!(limiter.check_at("signin:a", 1, Duration::MAX, now).await);
        assert!(!limiter.check_at("signin:a", 1, Duration::MAX, now).await);
        assert!(limiter.check_at("signin:a", 1, Duration::MAX, now + MAX_WINDOW + Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn prune_drops_expired_windows() {
        let store = InMemoryCounterStore::new();
        let now = Instant::now();
        store.hit("old", Duration::from_secs(1), now).await;
        store.hit("new", Duration::from_secs(600), now).await;

        assert_eq!(store.prune(now + Duration::from_secs(2)).await, 1);
        assert_eq!(store.prune(now + Duration::from_secs(2)).await, 0);
    }
}
