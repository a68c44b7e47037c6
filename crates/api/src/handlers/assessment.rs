//! Admin handlers for assessments and their questions.

use assessment_core::error::CoreError;
use assessment_core::scoring::validate_options;
use assessment_core::types::DbId;
use assessment_db::models::assessment::{
    Assessment, CreateAssessment, CreateQuestion, OptionInput, QuestionWithOptions,
    UpdateAssessment, UpdateQuestion,
};
use assessment_db::repositories::{AssessmentRepo, QuestionRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OptionRequest {
    pub label: String,
    #[validate(range(min = -100, max = 100))]
    pub score: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(length(min = 1, max = 100))]
    pub dimension: String,
    pub position: Option<i32>,
    #[validate(nested)]
    pub options: Vec<OptionRequest>,
    /// Index into `options` of the keyed answer.
    pub correct_index: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub dimension: Option<String>,
    pub position: Option<i32>,
    /// Replaces every option (and discards existing answers to this question).
    #[validate(nested)]
    pub options: Option<Vec<OptionRequest>>,
    pub correct_index: Option<usize>,
}

/// An assessment with its full question set.
#[derive(Debug, Serialize)]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub questions: Vec<QuestionWithOptions>,
}

fn assessment_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Assessment",
        id,
    })
}

fn question_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Question",
        id,
    })
}

/// Check option rules and convert to repository input.
fn checked_options(
    options: &[OptionRequest],
    correct_index: Option<usize>,
) -> AppResult<Vec<OptionInput>> {
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    validate_options(&labels, correct_index)?;
    Ok(options
        .iter()
        .map(|o| OptionInput {
            label: o.label.trim().to_string(),
            score: o.score,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/assessments
pub async fn list_assessments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Assessment>>>> {
    let data = AssessmentRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/assessments
pub async fn create_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(input): ValidatedJson<CreateAssessmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Assessment>>)> {
    let data = AssessmentRepo::create(
        &state.pool,
        &CreateAssessment {
            title: input.title,
            description: input.description,
            is_published: input.is_published,
        },
    )
    .await?;
    tracing::info!(assessment_id = data.id, "Assessment created");
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/admin/assessments/{id}
pub async fn get_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AssessmentDetail>>> {
    let assessment = AssessmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| assessment_not_found(id))?;
    let questions = QuestionRepo::list_with_options(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: AssessmentDetail {
            assessment,
            questions,
        },
    }))
}

/// PUT /api/v1/admin/assessments/{id}
pub async fn update_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateAssessmentRequest>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    let data = AssessmentRepo::update(
        &state.pool,
        id,
        &UpdateAssessment {
            title: input.title,
            description: input.description,
            is_published: input.is_published,
        },
    )
    .await?
    .ok_or_else(|| assessment_not_found(id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/admin/assessments/{id}
///
/// Removes questions, options, attempts and responses with the assessment.
pub async fn delete_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if AssessmentRepo::delete(&state.pool, id).await? {
        tracing::info!(assessment_id = id, "Assessment deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(assessment_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/assessments/{id}/questions
pub async fn list_questions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<QuestionWithOptions>>>> {
    if AssessmentRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(assessment_not_found(id));
    }
    let data = QuestionRepo::list_with_options(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/assessments/{id}/questions
pub async fn create_question(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateQuestionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<QuestionWithOptions>>)> {
    let options = checked_options(&input.options, input.correct_index)?;
    if AssessmentRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(assessment_not_found(id));
    }

    let position = match input.position {
        Some(p) => p,
        None => QuestionRepo::list_with_options(&state.pool, id).await?.len() as i32,
    };

    let data = QuestionRepo::create(
        &state.pool,
        &CreateQuestion {
            assessment_id: id,
            prompt: input.prompt,
            dimension: input.dimension.trim().to_lowercase(),
            position,
            options,
            correct_index: input.correct_index,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /api/v1/admin/questions/{id}
pub async fn update_question(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateQuestionRequest>,
) -> AppResult<Json<DataResponse<QuestionWithOptions>>> {
    let options = match &input.options {
        Some(options) => Some(checked_options(options, input.correct_index)?),
        None => None,
    };

    if options.is_none() {
        if let Some(index) = input.correct_index {
            let existing = QuestionRepo::find_with_options(&state.pool, id)
                .await?
                .ok_or_else(|| question_not_found(id))?;
            if index >= existing.options.len() {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Correct option index {index} is out of range"
                ))));
            }
        }
    }

    let data = QuestionRepo::update(
        &state.pool,
        id,
        &UpdateQuestion {
            prompt: input.prompt,
            dimension: input.dimension.map(|d| d.trim().to_lowercase()),
            position: input.position,
            options,
            correct_index: input.correct_index,
        },
    )
    .await?
    .ok_or_else(|| question_not_found(id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/admin/questions/{id}
pub async fn delete_question(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if QuestionRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(question_not_found(id))
    }
}
