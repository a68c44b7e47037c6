pub mod admin;
pub mod auth;
pub mod health;
pub mod organizations;
pub mod participate;

use assessment_core::rate_limit::LimitClass;
use axum::Router;

use crate::middleware::rate_limit::throttle;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route counts against the `api` limit class; groups marked below
/// also count against their own class.
///
/// ```text
/// /auth/login                                  login (public)               [auth]
/// /auth/logout                                 logout (requires auth)
/// /auth/me                                     caller profile
///
/// /organizations/{id}/participants             list, invite (admin or member)
/// /organizations/{id}/dashboard                aggregate counts             [dashboard]
/// /organizations/{id}/report                   per-participant results      [report]
///
/// /participate/{token}                         participant view (public)    [assessment]
/// /participate/{token}/attempts                start or resume attempt      [assessment]
/// /participate/{token}/attempts/{id}/responses upsert answers               [assessment]
/// /participate/{token}/attempts/{id}/complete  score and close              [assessment]
///
/// /admin/users                                 list, create (admin only)
/// /admin/users/{id}                            get, update, delete
/// /admin/users/{id}/reset-password             reset password
/// /admin/organizations                         list, create
/// /admin/organizations/{id}                    get, update, delete (cascading)
/// /admin/organizations/{id}/members            list, add
/// /admin/organizations/{id}/cohorts            list, create
/// /admin/cohorts/{id}                          update, delete
/// /admin/assessments                           list, create
/// /admin/assessments/{id}                      get, update, delete (cascading)
/// /admin/assessments/{id}/questions            list, create
/// /admin/questions/{id}                        update, delete
/// /admin/sessions                              live session count
/// /admin/sessions/users/{id}                   a user's live sessions
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let limiter = &state.rate_limiter;

    let routes = Router::new()
        .nest("/auth", auth::router(limiter))
        .nest("/organizations", organizations::router(limiter))
        .nest("/participate", participate::router(limiter))
        .nest("/admin", admin::router());

    throttle(routes, limiter, LimitClass::Api)
}
