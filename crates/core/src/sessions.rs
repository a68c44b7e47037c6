//! Concurrent session bookkeeping.
//!
//! A session slot is one `(user_id, ip_address)` pair. The manager caps the
//! number of live slots process-wide, expires slots that have been idle longer
//! than the configured timeout, and keeps a rolling per-minute request counter
//! so callers can throttle a chatty session without rejecting it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;

use crate::expiring::ExpiringMap;
use crate::sweep::Sweep;
use crate::types::DbId;

/// Length of the rolling request-counter window.
const REQUEST_WINDOW: Duration = Duration::from_secs(60);

/// Default cap on concurrent session slots.
pub const DEFAULT_MAX_SESSIONS: usize = 500;

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default per-session request ceiling per minute.
pub const DEFAULT_MAX_REQUESTS_PER_MINUTE: u32 = 120;

/// Limits applied by [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
    pub max_requests_per_minute: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_requests_per_minute: DEFAULT_MAX_REQUESTS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: DbId,
    email: String,
    ip_address: String,
    last_activity: Instant,
    request_count: u32,
    window_started: Instant,
}

/// Result of [`SessionManager::validate_session`].
///
/// `rate_limited` is only ever `true` for a valid session: throttling and
/// rejection are distinct outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionValidation {
    pub valid: bool,
    pub rate_limited: bool,
}

impl SessionValidation {
    const INVALID: Self = Self {
        valid: false,
        rate_limited: false,
    };
}

/// Read-only view of a live session, for admin observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user_id: DbId,
    pub email: String,
    pub ip_address: String,
    pub idle_secs: u64,
    pub request_count: u32,
}

pub struct SessionManager {
    sessions: ExpiringMap<SessionRecord>,
    policy: SessionPolicy,
}

fn session_key(user_id: DbId, ip_address: &str) -> String {
    format!("{user_id}:{ip_address}")
}

impl SessionManager {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            sessions: ExpiringMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Admit a session slot for `(user_id, ip_address)`.
    ///
    /// An existing live slot is refreshed and always accepted. A new slot is
    /// refused once the live slot count has reached `max_sessions`.
    pub async fn register_session(&self, user_id: DbId, email: &str, ip_address: &str) -> bool {
        let now = Instant::now();
        let key = session_key(user_id, ip_address);
        let expires_at = now + self.policy.idle_timeout;
        let mut guard = self.sessions.lock().await;

        if let Some(entry) = guard.get_live_mut(&key, now) {
            entry.value.last_activity = now;
            entry.value.email = email.to_string();
            entry.expires_at = expires_at;
            return true;
        }

        // Slots that idled out but have not been swept yet must not hold capacity.
        if guard.len() >= self.policy.max_sessions {
            guard.purge_expired(now);
            if guard.len() >= self.policy.max_sessions {
                return false;
            }
        }

        guard.insert(
            key,
            SessionRecord {
                user_id,
                email: email.to_string(),
                ip_address: ip_address.to_string(),
                last_activity: now,
                request_count: 0,
                window_started: now,
            },
            expires_at,
        );
        true
    }

    /// Check and touch the slot for `(user_id, ip_address)`.
    ///
    /// Absent or idle-expired slots are invalid (the latter are evicted here).
    /// A valid slot has its activity refreshed and its request counter bumped.
    pub async fn validate_session(&self, user_id: DbId, ip_address: &str) -> SessionValidation {
        let now = Instant::now();
        let key = session_key(user_id, ip_address);
        let mut guard = self.sessions.lock().await;

        let Some(entry) = guard.get_live_mut(&key, now) else {
            return SessionValidation::INVALID;
        };

        let record = &mut entry.value;
        if now.saturating_duration_since(record.window_started) >= REQUEST_WINDOW {
            record.window_started = now;
            record.request_count = 0;
        }
        record.request_count += 1;
        record.last_activity = now;
        let rate_limited = record.request_count > self.policy.max_requests_per_minute;
        entry.expires_at = now + self.policy.idle_timeout;

        SessionValidation {
            valid: true,
            rate_limited,
        }
    }

    /// Release the slot for `(user_id, ip_address)`. Returns `true` if one existed.
    pub async fn end_session(&self, user_id: DbId, ip_address: &str) -> bool {
        self.sessions
            .lock()
            .await
            .remove(&session_key(user_id, ip_address))
            .is_some()
    }

    /// Release every slot held by `user_id`. Returns the number released.
    pub async fn end_user_sessions(&self, user_id: DbId) -> usize {
        self.sessions
            .lock()
            .await
            .retain(|_, e| e.value.user_id != user_id)
    }

    /// Number of slots that have not idled out.
    pub async fn active_session_count(&self) -> usize {
        self.sessions.lock().await.live_len(Instant::now())
    }

    /// Live slots held by `user_id`. Linear scan over all sessions.
    pub async fn user_sessions(&self, user_id: DbId) -> Vec<SessionSnapshot> {
        let now = Instant::now();
        let guard = self.sessions.lock().await;
        let mut sessions: Vec<SessionSnapshot> = guard
            .iter()
            .filter(|(_, e)| e.value.user_id == user_id && !e.is_expired(now))
            .map(|(_, e)| SessionSnapshot {
                user_id: e.value.user_id,
                email: e.value.email.clone(),
                ip_address: e.value.ip_address.clone(),
                idle_secs: now.saturating_duration_since(e.value.last_activity).as_secs(),
                request_count: e.value.request_count,
            })
            .collect();
        sessions.sort_by(|a, b| a.ip_address.cmp(&b.ip_address));
        sessions
    }

    /// Drop every slot idle past the timeout.
    pub async fn purge_expired(&self) -> usize {
        self.sessions.purge_expired(Instant::now()).await
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

#[async_trait]
impl Sweep for SessionManager {
    fn name(&self) -> &'static str {
        "session_manager"
    }

    async fn sweep(&self) -> usize {
        self.purge_expired().await
    }
}
