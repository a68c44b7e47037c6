//! Admin handlers for organizations, their members and cohorts.

use assessment_core::error::CoreError;
use assessment_core::types::DbId;
use assessment_db::models::cohort::{Cohort, CreateCohort, UpdateCohort};
use assessment_db::models::organization::{
    CreateOrganization, Member, Organization, OrganizationDeletion, OrganizationSummary,
    UpdateOrganization,
};
use assessment_db::repositories::{
    CohortDeletion, CohortRepo, MembershipRepo, OrganizationRepo, UserRepo,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: DbId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CohortRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCohortRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

fn org_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Organization",
        id,
    })
}

async fn ensure_org_exists(state: &AppState, id: DbId) -> AppResult<Organization> {
    OrganizationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| org_not_found(id))
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/organizations
pub async fn list_organizations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<OrganizationSummary>>>> {
    let data = OrganizationRepo::list_summaries(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/organizations
pub async fn create_organization(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<OrganizationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Organization>>)> {
    let org = OrganizationRepo::create(
        &state.pool,
        &CreateOrganization {
            name: input.name.trim().to_string(),
        },
    )
    .await?;
    tracing::info!(organization_id = org.id, "Organization created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: org })))
}

/// GET /api/v1/admin/organizations/{id}
pub async fn get_organization(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Organization>>> {
    let data = ensure_org_exists(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/admin/organizations/{id}
pub async fn update_organization(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateOrganizationRequest>,
) -> AppResult<Json<DataResponse<Organization>>> {
    let data = OrganizationRepo::update(
        &state.pool,
        id,
        &UpdateOrganization {
            name: input.name.map(|n| n.trim().to_string()),
        },
    )
    .await?
    .ok_or_else(|| org_not_found(id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/admin/organizations/{id}
///
/// Cascading delete in one transaction. Returns the removed row counts.
pub async fn delete_organization(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrganizationDeletion>>> {
    let data = OrganizationRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| org_not_found(id))?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/organizations/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Member>>>> {
    ensure_org_exists(&state, id).await?;
    let data = MembershipRepo::list_members(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/organizations/{id}/members
///
/// Idempotent: adding an existing member returns the same list.
pub async fn add_member(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Member>>>)> {
    ensure_org_exists(&state, id).await?;
    if UserRepo::find_by_id(&state.pool, input.user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }));
    }

    MembershipRepo::add(&state.pool, id, input.user_id).await?;
    let data = MembershipRepo::list_members(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

// ---------------------------------------------------------------------------
// Cohorts
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/organizations/{id}/cohorts
pub async fn list_cohorts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Cohort>>>> {
    ensure_org_exists(&state, id).await?;
    let data = CohortRepo::list_by_organization(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/organizations/{id}/cohorts
pub async fn create_cohort(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CohortRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Cohort>>)> {
    ensure_org_exists(&state, id).await?;
    let data = CohortRepo::create(
        &state.pool,
        &CreateCohort {
            organization_id: id,
            name: input.name.trim().to_string(),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /api/v1/admin/cohorts/{id}
pub async fn update_cohort(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateCohortRequest>,
) -> AppResult<Json<DataResponse<Cohort>>> {
    let data = CohortRepo::update(
        &state.pool,
        id,
        &UpdateCohort {
            name: input.name.map(|n| n.trim().to_string()),
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Cohort", id }))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/admin/cohorts/{id}
///
/// 409 while active participants are still assigned to the cohort.
pub async fn delete_cohort(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match CohortRepo::delete(&state.pool, id).await? {
        CohortDeletion::Deleted => Ok(StatusCode::NO_CONTENT),
        CohortDeletion::NotFound => {
            Err(AppError::Core(CoreError::NotFound { entity: "Cohort", id }))
        }
        CohortDeletion::HasActiveParticipants(count) => Err(AppError::Core(CoreError::Conflict(
            format!("Cohort still has {count} active participant(s)"),
        ))),
    }
}
