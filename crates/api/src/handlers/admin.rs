//! Handlers for user and session administration under `/admin`.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use assessment_core::error::CoreError;
use assessment_core::roles::is_known_role;
use assessment_core::sessions::SessionSnapshot;
use assessment_core::types::DbId;
use assessment_db::models::role::Role;
use assessment_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use assessment_db::repositories::{RoleRepo, UserRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub password: String,
    /// Role name (`"admin"` or `"org_user"`).
    pub role: String,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /admin/users/{id}/reset-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Response for `GET /admin/sessions`.
#[derive(Debug, Serialize)]
pub struct SessionOverview {
    pub active_sessions: usize,
    pub max_sessions: usize,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    validate_password_strength(&input.password)?;
    let role = lookup_role(&state, &input.role).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email,
            full_name: input.full_name,
            password_hash,
            role_id: role.id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role.name, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: build_user_response(&user, role.name),
        }),
    ))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    // One role lookup for the whole page.
    let roles = RoleRepo::list(&state.pool).await?;

    let data = users
        .iter()
        .map(|u| {
            let role = roles
                .iter()
                .find(|r| r.id == u.role_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            build_user_response(u, role)
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: build_user_response(&user, role),
    }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Deactivating a user or changing their role also releases their live
/// sessions, so tokens minted under the old role stop working.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let role_id = match &input.role {
        Some(name) => Some(lookup_role(&state, name).await?.id),
        None => None,
    };

    let previous_role_id = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?
        .role_id;

    let user = UserRepo::update(
        &state.pool,
        id,
        &UpdateUser {
            email: input.email,
            full_name: input.full_name,
            role_id,
            is_active: input.is_active,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if input.is_active == Some(false) {
        let ended = state.sessions.end_user_sessions(id).await;
        tracing::info!(user_id = id, ended, "User deactivated, sessions released");
    } else if user.role_id != previous_role_id {
        let ended = state.sessions.end_user_sessions(id).await;
        tracing::info!(
            user_id = id,
            from_role_id = previous_role_id,
            to_role_id = user.role_id,
            ended,
            "User role changed, sessions released"
        );
    }

    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: build_user_response(&user, role),
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Removes the user and their memberships in one transaction, then releases
/// any live sessions. Returns 204 No Content.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::Core(CoreError::Conflict(
            "Administrators cannot delete their own account".into(),
        )));
    }
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }

    let ended = state.sessions.end_user_sessions(id).await;
    tracing::info!(user_id = id, ended, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password)?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if UserRepo::update_password(&state.pool, id, &password_hash).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "User", id }))
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/sessions
pub async fn session_overview(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<DataResponse<SessionOverview>> {
    Json(DataResponse {
        data: SessionOverview {
            active_sessions: state.sessions.active_session_count().await,
            max_sessions: state.sessions.policy().max_sessions,
        },
    })
}

/// GET /api/v1/admin/sessions/users/{id}
pub async fn user_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> Json<DataResponse<Vec<SessionSnapshot>>> {
    Json(DataResponse {
        data: state.sessions.user_sessions(id).await,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn lookup_role(state: &AppState, name: &str) -> AppResult<Role> {
    if !is_known_role(name) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown role: {name}"
        ))));
    }
    RoleRepo::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{name}' is not seeded")))
}

fn build_user_response(user: &User, role: String) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role,
        role_id: user.role_id,
        is_active: user.is_active,
        last_login_at: user.last_login_at,
        created_at: user.created_at,
    }
}
