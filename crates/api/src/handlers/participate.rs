//! Participant-facing handlers, authenticated by invitation token.
//!
//! The token in the path is hashed and matched against unexpired invitations;
//! unknown or expired tokens are rejected with 401.

use std::collections::{BTreeMap, HashSet};

use assessment_core::error::CoreError;
use assessment_core::scoring::{dimension_averages, AttemptScore};
use assessment_core::types::DbId;
use assessment_db::models::assessment::QuestionWithOptions;
use assessment_db::models::attempt::{AnswerInput, Attempt, Response, ScoredAttempt};
use assessment_db::models::participant::Participant;
use assessment_db::repositories::{
    AssessmentRepo, AttemptRepo, InvitationRepo, ParticipantRepo, QuestionRepo, ResponseRepo,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::invitation::hash_invitation_token;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    pub assessment_id: DbId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitResponsesRequest {
    #[validate(length(min = 1, max = 500))]
    pub responses: Vec<AnswerInput>,
}

/// An option as shown to participants: no weight, no key.
#[derive(Debug, Serialize)]
pub struct ParticipantOption {
    pub id: DbId,
    pub label: String,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct ParticipantQuestion {
    pub id: DbId,
    pub prompt: String,
    pub dimension: String,
    pub position: i32,
    pub options: Vec<ParticipantOption>,
}

#[derive(Debug, Serialize)]
pub struct PublishedAssessment {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<ParticipantQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub participant: Participant,
    pub assessments: Vec<PublishedAssessment>,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Serialize)]
pub struct CompletedAttempt {
    pub attempt: Attempt,
    pub score: AttemptScore,
    pub dimensions: BTreeMap<String, f64>,
}

impl From<QuestionWithOptions> for ParticipantQuestion {
    fn from(q: QuestionWithOptions) -> Self {
        Self {
            id: q.question.id,
            prompt: q.question.prompt,
            dimension: q.question.dimension,
            position: q.question.position,
            options: q
                .options
                .into_iter()
                .map(|o| ParticipantOption {
                    id: o.id,
                    label: o.label,
                    position: o.position,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/participate/{token}
///
/// The participant, every published assessment, and their attempts so far.
/// The first visit marks the invitation accepted.
pub async fn view(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<ParticipantView>>> {
    let (participant, invitation_id) = resolve_token(&state, &token).await?;
    InvitationRepo::mark_accepted(&state.pool, invitation_id).await?;

    let mut assessments = Vec::new();
    for assessment in AssessmentRepo::list_published(&state.pool).await? {
        let questions = QuestionRepo::list_with_options(&state.pool, assessment.id)
            .await?
            .into_iter()
            .map(ParticipantQuestion::from)
            .collect();
        assessments.push(PublishedAssessment {
            id: assessment.id,
            title: assessment.title,
            description: assessment.description,
            questions,
        });
    }
    let attempts = AttemptRepo::list_by_participant(&state.pool, participant.id).await?;

    Ok(Json(DataResponse {
        data: ParticipantView {
            participant,
            assessments,
            attempts,
        },
    }))
}

/// POST /api/v1/participate/{token}/attempts
///
/// Resume the open attempt at this assessment (200) or start one (201).
pub async fn start_attempt(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(input): ValidatedJson<StartAttemptRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Attempt>>)> {
    let (participant, _) = resolve_token(&state, &token).await?;

    let published = AssessmentRepo::find_by_id(&state.pool, input.assessment_id)
        .await?
        .is_some_and(|a| a.is_published);
    if !published {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Assessment",
            id: input.assessment_id,
        }));
    }

    if let Some(open) =
        AttemptRepo::find_open(&state.pool, participant.id, input.assessment_id).await?
    {
        return Ok((StatusCode::OK, Json(DataResponse { data: open })));
    }

    let attempt = AttemptRepo::create(&state.pool, participant.id, input.assessment_id).await?;
    tracing::info!(
        participant_id = participant.id,
        attempt_id = attempt.id,
        "Attempt started"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: attempt })))
}

/// PUT /api/v1/participate/{token}/attempts/{attempt_id}/responses
///
/// Record answers in one transaction; re-answering a question replaces the
/// earlier choice.
pub async fn submit_responses(
    State(state): State<AppState>,
    Path((token, attempt_id)): Path<(String, DbId)>,
    ValidatedJson(input): ValidatedJson<SubmitResponsesRequest>,
) -> AppResult<Json<DataResponse<Vec<Response>>>> {
    let (participant, _) = resolve_token(&state, &token).await?;
    let attempt = open_attempt(&state, &participant, attempt_id).await?;

    let valid: HashSet<(DbId, DbId)> =
        QuestionRepo::option_pairs_for_assessment(&state.pool, attempt.assessment_id)
            .await?
            .into_iter()
            .collect();
    if let Some(bad) = input
        .responses
        .iter()
        .find(|r| !valid.contains(&(r.question_id, r.option_id)))
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Option {} is not a choice for question {} in this assessment",
            bad.option_id, bad.question_id
        ))));
    }

    // The open check above is advisory; the repository re-checks under a row lock.
    let data = ResponseRepo::upsert_many(&state.pool, attempt.id, &input.responses)
        .await?
        .ok_or_else(already_completed)?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/participate/{token}/attempts/{attempt_id}/complete
pub async fn complete_attempt(
    State(state): State<AppState>,
    Path((token, attempt_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<CompletedAttempt>>> {
    let (participant, _) = resolve_token(&state, &token).await?;
    let attempt = open_attempt(&state, &participant, attempt_id).await?;

    let ScoredAttempt {
        attempt,
        score,
        answers,
    } = AttemptRepo::complete(&state.pool, attempt.id)
        .await?
        .ok_or_else(already_completed)?;

    tracing::info!(
        participant_id = participant.id,
        attempt_id = attempt.id,
        total = score.total,
        "Attempt completed"
    );

    Ok(Json(DataResponse {
        data: CompletedAttempt {
            attempt,
            dimensions: dimension_averages(&answers),
            score,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve an invitation token to its active participant and invitation id.
async fn resolve_token(state: &AppState, token: &str) -> AppResult<(Participant, DbId)> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid or expired invitation".into()));

    let invitation = InvitationRepo::find_valid_by_token_hash(&state.pool, &hash_invitation_token(token))
        .await?
        .ok_or_else(invalid)?;
    let participant = ParticipantRepo::find_by_id(&state.pool, invitation.participant_id)
        .await?
        .ok_or_else(invalid)?;

    if !participant.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Participant is no longer active".into(),
        )));
    }
    Ok((participant, invitation.id))
}

/// Load an attempt owned by `participant` that is still open.
async fn open_attempt(
    state: &AppState,
    participant: &Participant,
    attempt_id: DbId,
) -> AppResult<Attempt> {
    let attempt = AttemptRepo::find_by_id(&state.pool, attempt_id)
        .await?
        .filter(|a| a.participant_id == participant.id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Attempt",
            id: attempt_id,
        }))?;
    if attempt.is_completed() {
        return Err(already_completed());
    }
    Ok(attempt)
}

fn already_completed() -> AppError {
    AppError::Core(CoreError::Conflict("Attempt is already completed".into()))
}
