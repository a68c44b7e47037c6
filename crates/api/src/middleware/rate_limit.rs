//! Limit-class middleware.
//!
//! Each throttled route group counts requests per `(class, client ip)` and
//! answers 429 with `Retry-After` once its window is exhausted. Allowed and
//! denied responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset` (seconds until the window resets). When several
//! classes apply to one route the innermost, most specific, headers are kept.

use std::sync::Arc;
use std::time::Duration;

use assessment_core::error::CoreError;
use assessment_core::rate_limit::{LimitClass, RateLimitDecision, RateLimiter};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;

use super::client_ip::client_ip;
use crate::error::AppError;
use crate::state::AppState;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Middleware state: which limiter and which class a route group uses.
#[derive(Clone)]
pub struct ClassGuard {
    limiter: Arc<RateLimiter>,
    class: LimitClass,
}

/// Apply `class` to every route already registered on `router`.
///
/// Routes added to the returned router afterwards are not throttled.
pub fn throttle(
    router: Router<AppState>,
    limiter: &Arc<RateLimiter>,
    class: LimitClass,
) -> Router<AppState> {
    let guard = ClassGuard {
        limiter: Arc::clone(limiter),
        class,
    };
    router.route_layer(middleware::from_fn_with_state(guard, enforce))
}

async fn enforce(State(guard): State<ClassGuard>, request: Request, next: Next) -> Response {
    let client = client_ip(request.headers(), request.extensions());
    let key = guard.class.key_for(&client);
    let decision = guard.limiter.check(&key, guard.class).await;

    if !decision.allowed {
        tracing::warn!(class = %guard.class, client = %client, "Rate limit exceeded");
        let mut response = AppError::Core(CoreError::RateLimited {
            retry_after_secs: ceil_secs(decision.reset_after),
        })
        .into_response();
        apply_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &decision);
    response
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers
        .entry(LIMIT_HEADER)
        .or_insert_with(|| HeaderValue::from(decision.limit));
    headers
        .entry(REMAINING_HEADER)
        .or_insert_with(|| HeaderValue::from(decision.remaining));
    headers
        .entry(RESET_HEADER)
        .or_insert_with(|| HeaderValue::from(ceil_secs(decision.reset_after)));
}

/// Whole seconds, rounded up, never below one.
fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}
