use std::sync::Arc;

use assessment_core::rate_limit::RateLimiter;
use assessment_core::sessions::SessionManager;
use assessment_db::health::ConnectionHealth;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and every service is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: assessment_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Per-client request counters for the rate-limit middleware.
    pub rate_limiter: Arc<RateLimiter>,
    /// Concurrent session slots checked by the auth extractor.
    pub sessions: Arc<SessionManager>,
    /// Cached datastore liveness for degradable reads and `/health`.
    pub db_health: Arc<ConnectionHealth>,
}

impl AppState {
    /// Build state with fresh in-memory services sized from `config`.
    pub fn new(pool: assessment_db::DbPool, config: ServerConfig) -> Self {
        let db_health = ConnectionHealth::new(pool.clone(), config.db_health);
        let sessions = SessionManager::new(config.sessions);
        Self {
            pool,
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::new()),
            sessions: Arc::new(sessions),
            db_health: Arc::new(db_health),
        }
    }
}
