//! Repository for `questions`, `question_options` and `correct_answers`.
//!
//! A question and its options are always written together in one transaction.

use std::collections::HashMap;

use assessment_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::assessment::{
    CreateQuestion, OptionInput, Question, QuestionOption, QuestionWithOptions, UpdateQuestion,
};

const COLUMNS: &str = "id, assessment_id, prompt, dimension, position, created_at, updated_at";
const OPTION_COLUMNS: &str = "id, question_id, label, position, score";

pub struct QuestionRepo;

impl QuestionRepo {
    /// Insert a question with its options and optional keyed answer.
    pub async fn create(
        pool: &PgPool,
        input: &CreateQuestion,
    ) -> Result<QuestionWithOptions, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO questions (assessment_id, prompt, dimension, position)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let question = sqlx::query_as::<_, Question>(&query)
            .bind(input.assessment_id)
            .bind(&input.prompt)
            .bind(&input.dimension)
            .bind(input.position)
            .fetch_one(&mut *tx)
            .await?;

        let options = insert_options(&mut tx, question.id, &input.options).await?;
        let correct_option_id = input
            .correct_index
            .and_then(|i| options.get(i))
            .map(|o| o.id);
        set_correct_answer(&mut tx, question.id, correct_option_id).await?;

        tx.commit().await?;
        Ok(QuestionWithOptions {
            question,
            options,
            correct_option_id,
        })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_with_options(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<QuestionWithOptions>, sqlx::Error> {
        let Some(question) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let mut assembled = attach_options(pool, vec![question]).await?;
        Ok(assembled.pop())
    }

    /// All questions of an assessment in display order, with options.
    pub async fn list_with_options(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<QuestionWithOptions>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions WHERE assessment_id = $1 ORDER BY position, id"
        );
        let questions = sqlx::query_as::<_, Question>(&query)
            .bind(assessment_id)
            .fetch_all(pool)
            .await?;
        attach_options(pool, questions).await
    }

    /// Update a question. When `options` is given the full option set is
    /// replaced, which discards existing responses to this question.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateQuestion,
    ) -> Result<Option<QuestionWithOptions>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE questions SET
                prompt = COALESCE($2, prompt),
                dimension = COALESCE($3, dimension),
                position = COALESCE($4, position)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let Some(question) = sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .bind(&input.prompt)
            .bind(&input.dimension)
            .bind(input.position)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(new_options) = &input.options {
            delete_question_children(&mut tx, id).await?;
            let options = insert_options(&mut tx, id, new_options).await?;
            let correct = input
                .correct_index
                .and_then(|i| options.get(i))
                .map(|o| o.id);
            set_correct_answer(&mut tx, id, correct).await?;
        } else if let Some(index) = input.correct_index {
            let query = format!(
                "SELECT {OPTION_COLUMNS} FROM question_options
                 WHERE question_id = $1 ORDER BY position, id"
            );
            let existing = sqlx::query_as::<_, QuestionOption>(&query)
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
            set_correct_answer(&mut tx, id, existing.get(index).map(|o| o.id)).await?;
        }

        tx.commit().await?;
        let mut assembled = attach_options(pool, vec![question]).await?;
        Ok(assembled.pop())
    }

    /// Delete a question with its options, keyed answer and responses.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        delete_question_children(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Every `(question_id, option_id)` pair belonging to an assessment.
    pub async fn option_pairs_for_assessment(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<(DbId, DbId)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT q.id, o.id
             FROM questions q
             JOIN question_options o ON o.question_id = q.id
             WHERE q.assessment_id = $1",
        )
        .bind(assessment_id)
        .fetch_all(pool)
        .await
    }
}

async fn insert_options(
    conn: &mut PgConnection,
    question_id: DbId,
    options: &[OptionInput],
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    let query = format!(
        "INSERT INTO question_options (question_id, label, position, score)
         VALUES ($1, $2, $3, $4)
         RETURNING {OPTION_COLUMNS}"
    );
    let mut inserted = Vec::with_capacity(options.len());
    for (position, option) in options.iter().enumerate() {
        let row = sqlx::query_as::<_, QuestionOption>(&query)
            .bind(question_id)
            .bind(&option.label)
            .bind(position as i32)
            .bind(option.score)
            .fetch_one(&mut *conn)
            .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

async fn set_correct_answer(
    conn: &mut PgConnection,
    question_id: DbId,
    option_id: Option<DbId>,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM correct_answers WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    if let Some(option_id) = option_id {
        sqlx::query("INSERT INTO correct_answers (question_id, option_id) VALUES ($1, $2)")
            .bind(question_id)
            .bind(option_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Remove responses, keyed answer and options of a question (FK order).
async fn delete_question_children(
    conn: &mut PgConnection,
    question_id: DbId,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM responses WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM correct_answers WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM question_options WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Load options and keyed answers for `questions` in two queries.
async fn attach_options(
    pool: &PgPool,
    questions: Vec<Question>,
) -> Result<Vec<QuestionWithOptions>, sqlx::Error> {
    let ids: Vec<DbId> = questions.iter().map(|q| q.id).collect();

    let query = format!(
        "SELECT {OPTION_COLUMNS} FROM question_options
         WHERE question_id = ANY($1) ORDER BY position, id"
    );
    let options = sqlx::query_as::<_, QuestionOption>(&query)
        .bind(&ids)
        .fetch_all(pool)
        .await?;

    let correct: Vec<(DbId, DbId)> = sqlx::query_as(
        "SELECT question_id, option_id FROM correct_answers WHERE question_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;
    let correct: HashMap<DbId, DbId> = correct.into_iter().collect();

    let mut by_question: HashMap<DbId, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    Ok(questions
        .into_iter()
        .map(|question| QuestionWithOptions {
            options: by_question.remove(&question.id).unwrap_or_default(),
            correct_option_id: correct.get(&question.id).copied(),
            question,
        })
        .collect())
}
