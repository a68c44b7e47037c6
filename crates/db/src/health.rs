//! Cached datastore liveness.
//!
//! [`ConnectionHealth`] probes the database at most once per TTL and remembers
//! the answer. Callers that can degrade gracefully run their queries through
//! [`ConnectionHealth::execute_with_health_check`], which skips the query
//! entirely while the datastore is known to be down and cancels queries that
//! exceed the query timeout.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use assessment_core::expiring::ExpiringMap;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::time::{timeout, Instant};

/// Cache slot for the single process-wide status.
const STATUS_KEY: &str = "primary";

/// Something that can be asked "are you reachable right now?".
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl LivenessProbe for PgPool {
    async fn probe(&self) -> Result<(), sqlx::Error> {
        crate::health_check(self).await
    }
}

/// Timing knobs for [`ConnectionHealth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// How long a probe result is trusted.
    pub ttl: Duration,
    /// Upper bound on a single liveness probe.
    pub probe_timeout: Duration,
    /// Upper bound on a query run through `execute_with_health_check`.
    pub query_timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(3),
            query_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ConnectionHealth<P = PgPool> {
    probe: P,
    config: HealthCheckConfig,
    status: ExpiringMap<bool>,
}

impl<P: LivenessProbe> ConnectionHealth<P> {
    pub fn new(probe: P, config: HealthCheckConfig) -> Self {
        Self {
            probe,
            config,
            status: ExpiringMap::new(),
        }
    }

    pub fn config(&self) -> HealthCheckConfig {
        self.config
    }

    /// Whether the datastore is reachable, using the cached answer while it is fresh.
    ///
    /// The cache lock is held across the probe so concurrent callers wait for
    /// one probe instead of issuing their own.
    pub async fn is_connected(&self) -> bool {
        let mut guard = self.status.lock().await;
        if let Some(entry) = guard.get_live_mut(STATUS_KEY, Instant::now()) {
            return entry.value;
        }

        let healthy = match timeout(self.config.probe_timeout, self.probe.probe()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database liveness probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.probe_timeout.as_millis() as u64,
                    "Database liveness probe timed out"
                );
                false
            }
        };

        guard.insert(STATUS_KEY, healthy, Instant::now() + self.config.ttl);
        healthy
    }

    /// The cached status if it is still fresh, without probing.
    pub async fn cached_status(&self) -> Option<bool> {
        self.status
            .lock()
            .await
            .get_live_mut(STATUS_KEY, Instant::now())
            .map(|e| e.value)
    }

    /// Record the datastore as unreachable for one TTL.
    pub async fn mark_unhealthy(&self) {
        self.status
            .lock()
            .await
            .insert(STATUS_KEY, false, Instant::now() + self.config.ttl);
    }

    /// Forget the cached status so the next call probes again.
    pub async fn invalidate(&self) {
        self.status.lock().await.remove(STATUS_KEY);
    }

    /// Run `query` if the datastore is believed healthy, otherwise return `fallback`.
    ///
    /// A query that fails or exceeds `query_timeout` is dropped (cancelled),
    /// logged, flips the cached status to unhealthy, and yields `fallback`.
    pub async fn execute_with_health_check<T, E, F, Fut>(&self, query: F, fallback: T) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if !self.is_connected().await {
            tracing::debug!("Database marked unhealthy, serving fallback");
            return fallback;
        }

        match timeout(self.config.query_timeout, query()).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Health-checked query failed, serving fallback");
                self.mark_unhealthy().await;
                fallback
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.query_timeout.as_millis() as u64,
                    "Health-checked query timed out, serving fallback"
                );
                self.mark_unhealthy().await;
                fallback
            }
        }
    }
}
