//! Route definitions for the participant `/participate` resource.

use std::sync::Arc;

use assessment_core::rate_limit::{LimitClass, RateLimiter};
use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::participate;
use crate::middleware::rate_limit::throttle;
use crate::state::AppState;

/// Routes mounted at `/participate`. Authenticated by invitation token;
/// all count against the assessment submission limit class.
///
/// ```text
/// GET  /{token}                             -> view
/// POST /{token}/attempts                    -> start_attempt
/// PUT  /{token}/attempts/{attempt_id}/responses -> submit_responses
/// POST /{token}/attempts/{attempt_id}/complete  -> complete_attempt
/// ```
pub fn router(limiter: &Arc<RateLimiter>) -> Router<AppState> {
    let routes = Router::new()
        .route("/{token}", get(participate::view))
        .route("/{token}/attempts", post(participate::start_attempt))
        .route(
            "/{token}/attempts/{attempt_id}/responses",
            put(participate::submit_responses),
        )
        .route(
            "/{token}/attempts/{attempt_id}/complete",
            post(participate::complete_attempt),
        );

    throttle(routes, limiter, LimitClass::AssessmentSubmission)
}
