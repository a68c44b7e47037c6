//! Repository for the `attempts` table.

use assessment_core::scoring::{score_attempt, ScoredAnswer};
use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::attempt::{Attempt, ScoredAttempt};
use crate::repositories::ResponseRepo;

const COLUMNS: &str =
    "id, participant_id, assessment_id, started_at, completed_at, score, correct_count";

pub struct AttemptRepo;

impl AttemptRepo {
    pub async fn create(
        pool: &PgPool,
        participant_id: DbId,
        assessment_id: DbId,
    ) -> Result<Attempt, sqlx::Error> {
        let query = format!(
            "INSERT INTO attempts (participant_id, assessment_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attempt>(&query)
            .bind(participant_id)
            .bind(assessment_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Attempt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM attempts WHERE id = $1");
        sqlx::query_as::<_, Attempt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The participant's unfinished attempt at an assessment, if any.
    pub async fn find_open(
        pool: &PgPool,
        participant_id: DbId,
        assessment_id: DbId,
    ) -> Result<Option<Attempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attempts
             WHERE participant_id = $1 AND assessment_id = $2 AND completed_at IS NULL
             ORDER BY started_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Attempt>(&query)
            .bind(participant_id)
            .bind(assessment_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_participant(
        pool: &PgPool,
        participant_id: DbId,
    ) -> Result<Vec<Attempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attempts WHERE participant_id = $1 ORDER BY started_at DESC"
        );
        sqlx::query_as::<_, Attempt>(&query)
            .bind(participant_id)
            .fetch_all(pool)
            .await
    }

    /// Score an open attempt from its stored responses and stamp it completed.
    ///
    /// The attempt row is locked for the whole read-score-update sequence, the
    /// same lock [`ResponseRepo::upsert_many`] takes, so the stored score always
    /// matches the stored responses. Returns `None` if the attempt does not
    /// exist or was already completed.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<Option<ScoredAttempt>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if !Self::lock_open(&mut tx, id).await? {
            return Ok(None);
        }

        let answers: Vec<ScoredAnswer> = ResponseRepo::list_scored_inner(&mut tx, id)
            .await?
            .into_iter()
            .map(ScoredAnswer::from)
            .collect();
        let score = score_attempt(&answers);

        let query = format!(
            "UPDATE attempts SET completed_at = NOW(), score = $2, correct_count = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let attempt = sqlx::query_as::<_, Attempt>(&query)
            .bind(id)
            .bind(score.total)
            .bind(score.correct_count)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(ScoredAttempt {
            attempt,
            score,
            answers,
        }))
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Lock an open attempt row for the rest of the transaction.
    ///
    /// Returns `false` if the attempt is missing or already completed.
    pub(crate) async fn lock_open(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM attempts WHERE id = $1 AND completed_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.is_some())
    }
}
