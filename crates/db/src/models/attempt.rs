//! Attempt, response and reporting rows.

use assessment_core::scoring::{AttemptScore, ScoredAnswer};
use assessment_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `attempts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: DbId,
    pub participant_id: DbId,
    pub assessment_id: DbId,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub score: Option<i32>,
    pub correct_count: Option<i32>,
}

impl Attempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A row from the `responses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Response {
    pub id: DbId,
    pub attempt_id: DbId,
    pub question_id: DbId,
    pub option_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One answer submitted by a participant.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AnswerInput {
    pub question_id: DbId,
    pub option_id: DbId,
}

/// A response joined with the scoring data of its question and option.
#[derive(Debug, Clone, FromRow)]
pub struct ScoredResponseRow {
    pub attempt_id: DbId,
    pub question_id: DbId,
    pub option_id: DbId,
    pub option_score: i32,
    pub correct_option_id: Option<DbId>,
    pub dimension: String,
}

impl From<ScoredResponseRow> for ScoredAnswer {
    fn from(row: ScoredResponseRow) -> Self {
        ScoredAnswer {
            question_id: row.question_id,
            option_id: row.option_id,
            option_score: row.option_score,
            correct_option_id: row.correct_option_id,
            dimension: row.dimension,
        }
    }
}

/// An attempt stamped as completed, with the answers its score was computed from.
#[derive(Debug, Clone)]
pub struct ScoredAttempt {
    pub attempt: Attempt,
    pub score: AttemptScore,
    pub answers: Vec<ScoredAnswer>,
}

/// Aggregate counts for an organization dashboard.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DashboardSummary {
    pub participant_count: i64,
    pub invited_count: i64,
    pub started_count: i64,
    pub completed_count: i64,
    pub average_score: Option<f64>,
}

/// Latest completed attempt per participant, for organization reports.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantResult {
    pub participant_id: DbId,
    pub full_name: String,
    pub email: String,
    pub cohort_id: Option<DbId>,
    pub attempt_id: Option<DbId>,
    pub assessment_id: Option<DbId>,
    pub score: Option<i32>,
    pub correct_count: Option<i32>,
    pub completed_at: Option<Timestamp>,
}
