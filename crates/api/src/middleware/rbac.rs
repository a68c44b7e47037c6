//! Role-based access control.

use assessment_core::error::CoreError;
use assessment_core::types::DbId;
use assessment_db::repositories::{MembershipRepo, OrganizationRepo};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Allow admins and members of `organization_id`; 404 if it does not exist, 403 otherwise.
pub async fn require_org_access(
    state: &AppState,
    user: &AuthUser,
    organization_id: DbId,
) -> AppResult<()> {
    if OrganizationRepo::find_by_id(&state.pool, organization_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Organization",
            id: organization_id,
        }));
    }
    if user.is_admin() || MembershipRepo::is_member(&state.pool, organization_id, user.user_id).await? {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Not a member of this organization".into(),
    )))
}
