//! Fixed-window request counting keyed by client and limit class.
//!
//! A window starts on the first request for a key and lasts `window`. Within a
//! window the first `max_requests` calls are allowed and the rest are denied
//! without touching the stored count. Once the window has elapsed the next
//! request replaces the entry with a fresh window.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::expiring::ExpiringMap;
use crate::sweep::Sweep;

// ---------------------------------------------------------------------------
// Policy table
// ---------------------------------------------------------------------------

/// A `(max_requests, window)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Route groups with their own request ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitClass {
    /// Login and other credential-bearing endpoints.
    Auth,
    /// Every `/api/v1` route.
    Api,
    /// Participant answer submission and attempt lifecycle.
    AssessmentSubmission,
    /// Organization dashboard reads.
    Dashboard,
    /// Report generation.
    Report,
}

impl LimitClass {
    pub const fn policy(self) -> RateLimit {
        match self {
            LimitClass::Auth => RateLimit::new(5, Duration::from_secs(15 * 60)),
            LimitClass::Api => RateLimit::new(100, Duration::from_secs(60)),
            LimitClass::AssessmentSubmission => RateLimit::new(30, Duration::from_secs(60)),
            LimitClass::Dashboard => RateLimit::new(200, Duration::from_secs(60)),
            LimitClass::Report => RateLimit::new(10, Duration::from_secs(5 * 60)),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LimitClass::Auth => "auth",
            LimitClass::Api => "api",
            LimitClass::AssessmentSubmission => "assessment",
            LimitClass::Dashboard => "dashboard",
            LimitClass::Report => "report",
        }
    }

    /// Limiter key for a client under this class, e.g. `auth:10.0.0.1`.
    pub fn key_for(self, client: &str) -> String {
        format!("{}:{client}", self.as_str())
    }
}

impl fmt::Display for LimitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Limiter
// ---------------------------------------------------------------------------

/// Outcome of [`RateLimiter::check`], carrying what the HTTP layer needs for headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

/// In-memory fixed-window rate limiter.
///
/// State is per process. Several server instances each keep their own counts.
pub struct RateLimiter {
    windows: ExpiringMap<u32>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: ExpiringMap::new(),
        }
    }

    /// Count a request against `key` and report whether it is allowed.
    pub async fn is_allowed(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        self.check_at(key, RateLimit::new(max_requests, window), Instant::now())
            .await
            .allowed
    }

    /// Count a request against `key` under `class` and return the full decision.
    pub async fn check(&self, key: &str, class: LimitClass) -> RateLimitDecision {
        self.check_at(key, class.policy(), Instant::now()).await
    }

    async fn check_at(&self, key: &str, limit: RateLimit, now: Instant) -> RateLimitDecision {
        let mut guard = self.windows.lock().await;

        if let Some(entry) = guard.get_live_mut(key, now) {
            let reset_after = entry.expires_at.saturating_duration_since(now);
            if entry.value >= limit.max_requests {
                return RateLimitDecision {
                    allowed: false,
                    limit: limit.max_requests,
                    remaining: 0,
                    reset_after,
                };
            }
            entry.value += 1;
            return RateLimitDecision {
                allowed: true,
                limit: limit.max_requests,
                remaining: limit.max_requests - entry.value,
                reset_after,
            };
        }

        guard.insert(key, 1, now + limit.window);
        RateLimitDecision {
            allowed: true,
            limit: limit.max_requests,
            remaining: limit.max_requests.saturating_sub(1),
            reset_after: limit.window,
        }
    }

    /// Requests left in the active window, or `max_requests` if no window is active.
    ///
    /// `_window` is accepted so call sites can pass the same policy they check with.
    pub async fn remaining_requests(&self, key: &str, max_requests: u32, _window: Duration) -> u32 {
        let now = Instant::now();
        let guard = self.windows.lock().await;
        match guard.get(key) {
            Some(entry) if !entry.is_expired(now) => max_requests.saturating_sub(entry.value),
            _ => max_requests,
        }
    }

    /// Stored reset instant for `key`, if any.
    pub async fn reset_time(&self, key: &str) -> Option<Instant> {
        self.windows.lock().await.get(key).map(|e| e.expires_at)
    }

    /// Drop every window whose reset time has passed.
    pub async fn purge_expired(&self) -> usize {
        self.windows.purge_expired(Instant::now()).await
    }

    /// Number of tracked keys (including elapsed windows not yet swept).
    pub async fn tracked_keys(&self) -> usize {
        self.windows.len().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sweep for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    async fn sweep(&self) -> usize {
        self.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    #[tokio::test(start_paused = true)]
    async fn allows_exactly_max_requests_per_window() {
        let limiter = RateLimiter::new();

        for i in 0..5 {
            assert!(limiter.is_allowed("k", 5, WINDOW).await, "call {i} should pass");
        }
        assert!(!limiter.is_allowed("k", 5, WINDOW).await, "6th call must be denied");

        tokio::time::advance(Duration::from_millis(60_001)).await;
        assert!(limiter.is_allowed("k", 5, WINDOW).await);
        assert_eq!(limiter.remaining_requests("k", 5, WINDOW).await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn denial_does_not_extend_or_count() {
        let limiter = RateLimiter::new();
        assert!(limiter.is_allowed("k", 1, WINDOW).await);
        let reset = limiter.reset_time("k").await;

        for _ in 0..3 {
            assert!(!limiter.is_allowed("k", 1, WINDOW).await);
        }
        assert_eq!(limiter.reset_time("k").await, reset);
        assert_eq!(limiter.remaining_requests("k", 1, WINDOW).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_tracks_count_and_resets_after_window() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.remaining_requests("k", 5, WINDOW).await, 5);

        limiter.is_allowed("k", 5, WINDOW).await;
        limiter.is_allowed("k", 5, WINDOW).await;
        assert_eq!(limiter.remaining_requests("k", 5, WINDOW).await, 3);

        // Lapsed window reports full quota even before the next is_allowed call.
        tokio::time::advance(Duration::from_millis(60_001)).await;
        assert_eq!(limiter.remaining_requests("k", 5, WINDOW).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new();
        assert!(limiter.is_allowed("a", 1, WINDOW).await);
        assert!(!limiter.is_allowed("a", 1, WINDOW).await);
        assert!(limiter.is_allowed("b", 1, WINDOW).await);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_time_is_window_start_plus_window() {
        let limiter = RateLimiter::new();
        assert!(limiter.reset_time("k").await.is_none());

        let start = Instant::now();
        limiter.is_allowed("k", 3, WINDOW).await;
        assert_eq!(limiter.reset_time("k").await, Some(start + WINDOW));
    }

    #[tokio::test(start_paused = true)]
    async fn check_reports_headers_for_class() {
        let limiter = RateLimiter::new();
        let key = LimitClass::Auth.key_for("10.0.0.1");

        let first = limiter.check(&key, LimitClass::Auth).await;
        assert!(first.allowed);
        assert_eq!(first.limit, 5);
        assert_eq!(first.remaining, 4);
        assert_eq!(first.reset_after, Duration::from_secs(900));

        for _ in 0..4 {
            limiter.check(&key, LimitClass::Auth).await;
        }
        tokio::time::advance(Duration::from_secs(100)).await;
        let denied = limiter.check(&key, LimitClass::Auth).await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_after, Duration::from_secs(800));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_elapsed_windows() {
        let limiter = RateLimiter::new();
        limiter.is_allowed("short", 5, Duration::from_secs(1)).await;
        limiter.is_allowed("long", 5, Duration::from_secs(600)).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[test]
    fn auth_and_submission_are_stricter_than_reads() {
        let per_minute = |c: LimitClass| {
            let p = c.policy();
            p.max_requests as f64 / p.window.as_secs_f64() * 60.0
        };
        assert!(per_minute(LimitClass::Auth) < per_minute(LimitClass::Api));
        assert!(per_minute(LimitClass::AssessmentSubmission) < per_minute(LimitClass::Dashboard));
        assert_eq!(LimitClass::Report.key_for("1.2.3.4"), "report:1.2.3.4");
    }
}
