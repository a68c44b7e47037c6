//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin, assessment, organization};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /users                          -> list_users
/// POST   /users                          -> create_user
/// GET    /users/{id}                     -> get_user
/// PUT    /users/{id}                     -> update_user
/// DELETE /users/{id}                     -> delete_user
/// POST   /users/{id}/reset-password      -> reset_password
///
/// GET    /organizations                  -> list_organizations
/// POST   /organizations                  -> create_organization
/// GET    /organizations/{id}             -> get_organization
/// PUT    /organizations/{id}             -> update_organization
/// DELETE /organizations/{id}             -> delete_organization
/// GET    /organizations/{id}/members     -> list_members
/// POST   /organizations/{id}/members     -> add_member
/// GET    /organizations/{id}/cohorts     -> list_cohorts
/// POST   /organizations/{id}/cohorts     -> create_cohort
/// PUT    /cohorts/{id}                   -> update_cohort
/// DELETE /cohorts/{id}                   -> delete_cohort
///
/// GET    /assessments                    -> list_assessments
/// POST   /assessments                    -> create_assessment
/// GET    /assessments/{id}               -> get_assessment
/// PUT    /assessments/{id}               -> update_assessment
/// DELETE /assessments/{id}               -> delete_assessment
/// GET    /assessments/{id}/questions     -> list_questions
/// POST   /assessments/{id}/questions     -> create_question
/// PUT    /questions/{id}                 -> update_question
/// DELETE /questions/{id}                 -> delete_question
///
/// GET    /sessions                       -> session_overview
/// GET    /sessions/users/{id}            -> user_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/users/{id}/reset-password", post(admin::reset_password))
        // Organizations
        .route(
            "/organizations",
            get(organization::list_organizations).post(organization::create_organization),
        )
        .route(
            "/organizations/{id}",
            get(organization::get_organization)
                .put(organization::update_organization)
                .delete(organization::delete_organization),
        )
        .route(
            "/organizations/{id}/members",
            get(organization::list_members).post(organization::add_member),
        )
        .route(
            "/organizations/{id}/cohorts",
            get(organization::list_cohorts).post(organization::create_cohort),
        )
        .route(
            "/cohorts/{id}",
            put(organization::update_cohort).delete(organization::delete_cohort),
        )
        // Assessments
        .route(
            "/assessments",
            get(assessment::list_assessments).post(assessment::create_assessment),
        )
        .route(
            "/assessments/{id}",
            get(assessment::get_assessment)
                .put(assessment::update_assessment)
                .delete(assessment::delete_assessment),
        )
        .route(
            "/assessments/{id}/questions",
            get(assessment::list_questions).post(assessment::create_question),
        )
        .route(
            "/questions/{id}",
            put(assessment::update_question).delete(assessment::delete_question),
        )
        // Sessions
        .route("/sessions", get(admin::session_overview))
        .route("/sessions/users/{id}", get(admin::user_sessions))
}
