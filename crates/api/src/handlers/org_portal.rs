//! Organization-facing handlers: participants, dashboard and report.
//!
//! Every handler requires an authenticated user who is an admin or a member
//! of the organization in the path.

use std::collections::{BTreeMap, HashMap};

use assessment_core::error::CoreError;
use assessment_core::scoring::{dimension_averages, ScoredAnswer};
use assessment_core::types::{DbId, Timestamp};
use assessment_db::models::attempt::{DashboardSummary, ParticipantResult, ScoredResponseRow};
use assessment_db::models::participant::{CreateParticipant, Participant};
use assessment_db::repositories::{CohortRepo, ParticipantRepo, ReportRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::invitation::generate_invitation_token;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_org_access;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for inviting a participant.
#[derive(Debug, Deserialize, Validate)]
pub struct InviteParticipantRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub cohort_id: Option<DbId>,
}

/// A newly invited participant and the one-time invitation token.
#[derive(Debug, Serialize)]
pub struct InvitationIssued {
    pub participant: Participant,
    /// Plaintext token; it is not stored and cannot be retrieved again.
    pub invitation_token: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub organization_id: DbId,
    #[serde(flatten)]
    pub summary: DashboardSummary,
    /// `true` when the datastore was unreachable and the counts are empty placeholders.
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct ParticipantReport {
    #[serde(flatten)]
    pub result: ParticipantResult,
    pub dimensions: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationReport {
    pub organization_id: DbId,
    pub participants: Vec<ParticipantReport>,
    /// Mean option score per dimension over every completed attempt.
    pub dimensions: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// GET /api/v1/organizations/{id}/participants
pub async fn list_participants(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Participant>>>> {
    require_org_access(&state, &user, id).await?;
    let data = ParticipantRepo::list_by_organization(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/organizations/{id}/participants
///
/// Create a participant and an invitation. The plaintext token is returned
/// once; delivering it is up to the caller.
pub async fn invite_participant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<InviteParticipantRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<InvitationIssued>>)> {
    require_org_access(&state, &user, id).await?;

    if let Some(cohort_id) = input.cohort_id {
        let cohort = CohortRepo::find_by_id(&state.pool, cohort_id).await?;
        if !matches!(cohort, Some(c) if c.organization_id == id) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Cohort {cohort_id} does not belong to organization {id}"
            ))));
        }
    }

    let (invitation_token, token_hash) = generate_invitation_token();
    let expires_at = Utc::now() + chrono::Duration::days(state.config.invitation_expiry_days);
    let (participant, _) = ParticipantRepo::create_with_invitation(
        &state.pool,
        &CreateParticipant {
            organization_id: id,
            cohort_id: input.cohort_id,
            email: input.email.trim().to_lowercase(),
            full_name: input.full_name.trim().to_string(),
        },
        &token_hash,
        expires_at,
    )
    .await?;

    tracing::info!(
        organization_id = id,
        participant_id = participant.id,
        invited_by = user.user_id,
        "Invitation issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: InvitationIssued {
                participant,
                invitation_token,
                expires_at,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Dashboard and report
// ---------------------------------------------------------------------------

/// GET /api/v1/organizations/{id}/dashboard
///
/// Served through the datastore health cache: while the database is known to
/// be down the counts are empty and `degraded` is `true`.
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DashboardResponse>>> {
    require_org_access(&state, &user, id).await?;

    let pool = &state.pool;
    let summary = state
        .db_health
        .execute_with_health_check(
            || async move { ReportRepo::dashboard_summary(pool, id).await.map(Some) },
            None,
        )
        .await;

    Ok(Json(DataResponse {
        data: DashboardResponse {
            organization_id: id,
            degraded: summary.is_none(),
            summary: summary.unwrap_or_default(),
        },
    }))
}

/// GET /api/v1/organizations/{id}/report
pub async fn report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrganizationReport>>> {
    require_org_access(&state, &user, id).await?;

    let results = ReportRepo::participant_results(&state.pool, id).await?;
    let rows = ReportRepo::scored_responses_for_org(&state.pool, id).await?;

    let answers: Vec<(DbId, ScoredAnswer)> = rows.into_iter().map(into_scored).collect();
    let overall: Vec<ScoredAnswer> = answers.iter().map(|(_, a)| a.clone()).collect();

    let mut by_attempt: HashMap<DbId, Vec<ScoredAnswer>> = HashMap::new();
    for (attempt_id, answer) in answers {
        by_attempt.entry(attempt_id).or_default().push(answer);
    }

    let participants = results
        .into_iter()
        .map(|result| {
            let dimensions = result
                .attempt_id
                .and_then(|a| by_attempt.get(&a))
                .map(|answers| dimension_averages(answers))
                .unwrap_or_default();
            ParticipantReport { result, dimensions }
        })
        .collect();

    Ok(Json(DataResponse {
        data: OrganizationReport {
            organization_id: id,
            participants,
            dimensions: dimension_averages(&overall),
        },
    }))
}

/// Split a joined row into its attempt id and the scoring input.
fn into_scored(row: ScoredResponseRow) -> (DbId, ScoredAnswer) {
    (row.attempt_id, ScoredAnswer::from(row))
}
