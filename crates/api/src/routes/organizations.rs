//! Route definitions for organization-facing `/organizations` routes.

use std::sync::Arc;

use assessment_core::rate_limit::{LimitClass, RateLimiter};
use axum::routing::get;
use axum::Router;

use crate::handlers::org_portal;
use crate::middleware::rate_limit::throttle;
use crate::state::AppState;

/// Routes mounted at `/organizations`. Admins or members of `{id}` only.
///
/// ```text
/// GET  /{id}/participants  -> list_participants
/// POST /{id}/participants  -> invite_participant
/// GET  /{id}/dashboard     -> dashboard  (dashboard limit class)
/// GET  /{id}/report        -> report     (report limit class)
/// ```
pub fn router(limiter: &Arc<RateLimiter>) -> Router<AppState> {
    let dashboard = throttle(
        Router::new().route("/{id}/dashboard", get(org_portal::dashboard)),
        limiter,
        LimitClass::Dashboard,
    );
    let report = throttle(
        Router::new().route("/{id}/report", get(org_portal::report)),
        limiter,
        LimitClass::Report,
    );

    Router::new()
        .route(
            "/{id}/participants",
            get(org_portal::list_participants).post(org_portal::invite_participant),
        )
        .merge(dashboard)
        .merge(report)
}
