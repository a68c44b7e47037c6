//! Repository for the `assessments` table.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::{Assessment, CreateAssessment, UpdateAssessment};

const COLUMNS: &str = "id, title, description, is_published, created_at, updated_at";

pub struct AssessmentRepo;

impl AssessmentRepo {
    pub async fn create(pool: &PgPool, input: &CreateAssessment) -> Result<Assessment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assessments (title, description, is_published)
             VALUES ($1, $2, COALESCE($3, false))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.is_published)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments WHERE id = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Assessment>(&query).fetch_all(pool).await
    }

    /// Published assessments only, oldest first.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessments WHERE is_published = true ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Assessment>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAssessment,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                is_published = COALESCE($4, is_published)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.is_published)
            .fetch_optional(pool)
            .await
    }

    /// Delete an assessment with its questions, options, attempts and responses.
    ///
    /// Returns `false` (and changes nothing) if the assessment does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM responses WHERE attempt_id IN (
                SELECT id FROM attempts WHERE assessment_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM attempts WHERE assessment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM correct_answers WHERE question_id IN (
                SELECT id FROM questions WHERE assessment_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM question_options WHERE question_id IN (
                SELECT id FROM questions WHERE assessment_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM questions WHERE assessment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM assessments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }
}
