use std::str::FromStr;
use std::time::Duration;

use assessment_core::sessions::SessionPolicy;
use assessment_db::health::HealthCheckConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Concurrent session limits.
    pub sessions: SessionPolicy,
    /// How often the expiry sweeps run.
    pub sweep_interval: Duration,
    /// Datastore health cache timings.
    pub db_health: HealthCheckConfig,
    /// Lifetime of a participant invitation token, in days (default: `14`).
    pub invitation_expiry_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `HOST`                            | `0.0.0.0`               |
    /// | `PORT`                            | `3000`                  |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                    |
    /// | `MAX_CONCURRENT_SESSIONS`         | `500`                   |
    /// | `SESSION_IDLE_TIMEOUT_SECS`       | `1800`                  |
    /// | `SESSION_MAX_REQUESTS_PER_MINUTE` | `120`                   |
    /// | `SWEEP_INTERVAL_SECS`             | `60`                    |
    /// | `DB_HEALTH_TTL_SECS`              | `30`                    |
    /// | `DB_PROBE_TIMEOUT_SECS`           | `3`                     |
    /// | `DB_QUERY_TIMEOUT_SECS`           | `10`                    |
    /// | `INVITATION_EXPIRY_DAYS`          | `14`                    |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but does not parse, if an interval or
    /// timeout is zero, or if `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = SessionPolicy::default();
        let sessions = SessionPolicy {
            max_sessions: env_or("MAX_CONCURRENT_SESSIONS", defaults.max_sessions),
            idle_timeout: positive_secs("SESSION_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs()),
            max_requests_per_minute: env_or(
                "SESSION_MAX_REQUESTS_PER_MINUTE",
                defaults.max_requests_per_minute,
            ),
        };

        let health_defaults = HealthCheckConfig::default();
        let db_health = HealthCheckConfig {
            ttl: Duration::from_secs(env_or("DB_HEALTH_TTL_SECS", health_defaults.ttl.as_secs())),
            probe_timeout: positive_secs(
                "DB_PROBE_TIMEOUT_SECS",
                health_defaults.probe_timeout.as_secs(),
            ),
            query_timeout: positive_secs(
                "DB_QUERY_TIMEOUT_SECS",
                health_defaults.query_timeout.as_secs(),
            ),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            sessions,
            sweep_interval: positive_secs("SWEEP_INTERVAL_SECS", 60),
            db_health,
            invitation_expiry_days: env_or("INVITATION_EXPIRY_DAYS", 14),
        }
    }
}

/// Read and parse `name`, or return `default` when it is unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value: {e}")),
        Err(_) => default,
    }
}

/// Read a duration in whole seconds that must be non-zero.
fn positive_secs(name: &str, default: u64) -> Duration {
    let secs: u64 = env_or(name, default);
    assert!(secs > 0, "{name} must be greater than zero");
    Duration::from_secs(secs)
}
