//! Handlers for the `/auth` resource (login, logout, me).

use assessment_core::error::CoreError;
use assessment_core::types::DbId;
use assessment_db::models::organization::Organization;
use assessment_db::repositories::{MembershipRepo, RoleRepo, UserRepo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::client_ip::ClientIp;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

/// Response for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
    pub organizations: Vec<Organization>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Verify email + password, claim a session slot for the caller's address,
/// and return an access token.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, ip = %ip_address, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if !state
        .sessions
        .register_session(user.id, &user.email, &ip_address)
        .await
    {
        tracing::warn!(
            user_id = user.id,
            max_sessions = state.sessions.policy().max_sessions,
            "Login refused: concurrent session capacity reached"
        );
        return Err(AppError::Core(CoreError::Unavailable(
            "Too many active sessions, please try again later".into(),
        )));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let access_token = generate_access_token(user.id, &role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, ip = %ip_address, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        expires_in: state.config.jwt.expires_in_secs(),
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role,
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Release the caller's session slot. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> StatusCode {
    state
        .sessions
        .end_session(user.user_id, &user.ip_address)
        .await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<MeResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    let organizations = MembershipRepo::list_organizations_for_user(&state.pool, user.id).await?;

    Ok(Json(MeResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: auth.role,
        },
        organizations,
    }))
}
