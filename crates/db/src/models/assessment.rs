//! Assessment, question and option models.

use assessment_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assessments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssessment {
    pub title: String,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAssessment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub assessment_id: DbId,
    pub prompt: String,
    pub dimension: String,
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `question_options` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionOption {
    pub id: DbId,
    pub question_id: DbId,
    pub label: String,
    pub position: i32,
    pub score: i32,
}

/// Option input for question create/replace.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionInput {
    pub label: String,
    pub score: i32,
}

/// DTO for creating a question together with its options.
#[derive(Debug)]
pub struct CreateQuestion {
    pub assessment_id: DbId,
    pub prompt: String,
    pub dimension: String,
    pub position: i32,
    pub options: Vec<OptionInput>,
    /// Index into `options` of the keyed answer, if any.
    pub correct_index: Option<usize>,
}

/// DTO for updating a question. `options`, when present, replaces the full set.
#[derive(Debug, Default)]
pub struct UpdateQuestion {
    pub prompt: Option<String>,
    pub dimension: Option<String>,
    pub position: Option<i32>,
    pub options: Option<Vec<OptionInput>>,
    pub correct_index: Option<usize>,
}

/// A question with its options and keyed answer, for admin views.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
    pub correct_option_id: Option<DbId>,
}
