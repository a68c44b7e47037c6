//! Repository for the `responses` table.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::attempt::{AnswerInput, Response, ScoredResponseRow};
use crate::repositories::AttemptRepo;

const COLUMNS: &str = "id, attempt_id, question_id, option_id, created_at, updated_at";

const SCORED_QUERY: &str = "SELECT r.attempt_id, r.question_id, r.option_id,
        o.score AS option_score,
        ca.option_id AS correct_option_id,
        q.dimension
 FROM responses r
 JOIN question_options o ON o.id = r.option_id
 JOIN questions q ON q.id = r.question_id
 LEFT JOIN correct_answers ca ON ca.question_id = r.question_id
 WHERE r.attempt_id = $1
 ORDER BY q.position, q.id";

pub struct ResponseRepo;

impl ResponseRepo {
    /// Record answers for an attempt. A later answer to the same question
    /// replaces the earlier one. All answers are written or none are.
    ///
    /// Returns `None` without writing if the attempt is missing or already
    /// completed. The attempt row stays locked until commit, so a concurrent
    /// [`AttemptRepo::complete`] scores either before or after these answers.
    pub async fn upsert_many(
        pool: &PgPool,
        attempt_id: DbId,
        answers: &[AnswerInput],
    ) -> Result<Option<Vec<Response>>, sqlx::Error> {
        let query = format!(
            "INSERT INTO responses (attempt_id, question_id, option_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (attempt_id, question_id)
             DO UPDATE SET option_id = EXCLUDED.option_id
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        if !AttemptRepo::lock_open(&mut tx, attempt_id).await? {
            return Ok(None);
        }

        let mut saved = Vec::with_capacity(answers.len());
        for answer in answers {
            let row = sqlx::query_as::<_, Response>(&query)
                .bind(attempt_id)
                .bind(answer.question_id)
                .bind(answer.option_id)
                .fetch_one(&mut *tx)
                .await?;
            saved.push(row);
        }
        tx.commit().await?;
        Ok(Some(saved))
    }

    pub async fn list_by_attempt(
        pool: &PgPool,
        attempt_id: DbId,
    ) -> Result<Vec<Response>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM responses WHERE attempt_id = $1 ORDER BY question_id"
        );
        sqlx::query_as::<_, Response>(&query)
            .bind(attempt_id)
            .fetch_all(pool)
            .await
    }

    /// Responses of an attempt joined with option weight, keyed answer and dimension.
    pub async fn list_scored(
        pool: &PgPool,
        attempt_id: DbId,
    ) -> Result<Vec<ScoredResponseRow>, sqlx::Error> {
        sqlx::query_as::<_, ScoredResponseRow>(SCORED_QUERY)
            .bind(attempt_id)
            .fetch_all(pool)
            .await
    }

    /// [`ResponseRepo::list_scored`] within an existing transaction.
    pub(crate) async fn list_scored_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        attempt_id: DbId,
    ) -> Result<Vec<ScoredResponseRow>, sqlx::Error> {
        sqlx::query_as::<_, ScoredResponseRow>(SCORED_QUERY)
            .bind(attempt_id)
            .fetch_all(&mut **tx)
            .await
    }
}
