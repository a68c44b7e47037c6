//! Authenticated-user extractor.

use assessment_core::error::CoreError;
use assessment_core::roles::ROLE_ADMIN;
use assessment_core::types::DbId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::client_ip::client_ip;
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Seconds a session-throttled caller is told to wait.
const SESSION_RETRY_AFTER_SECS: u64 = 60;

/// A platform user with a valid bearer token and a live session slot.
///
/// The session slot is keyed by `(user_id, client ip)`; it is created at login
/// and touched on every authenticated request.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name.
    pub role: String,
    /// Address the session slot is bound to.
    pub ip_address: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let ip_address = client_ip(&parts.headers, &parts.extensions);
        let session = state.sessions.validate_session(claims.sub, &ip_address).await;
        if !session.valid {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Session expired or not found, please log in again".into(),
            )));
        }
        if session.rate_limited {
            tracing::warn!(user_id = claims.sub, ip = %ip_address, "Session request ceiling exceeded");
            return Err(AppError::Core(CoreError::RateLimited {
                retry_after_secs: SESSION_RETRY_AFTER_SECS,
            }));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            ip_address,
        })
    }
}
