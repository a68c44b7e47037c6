//! Route definitions for the `/auth` resource.

use std::sync::Arc;

use assessment_core::rate_limit::{LimitClass, RateLimiter};
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::middleware::rate_limit::throttle;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login   -> login   (auth limit class)
/// POST /logout  -> logout  (requires auth)
/// GET  /me      -> me      (requires auth)
/// ```
pub fn router(limiter: &Arc<RateLimiter>) -> Router<AppState> {
    let login = Router::new().route("/login", post(auth::login));

    throttle(login, limiter, LimitClass::Auth)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
