//! Repository for the `cohorts` table.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::cohort::{Cohort, CreateCohort, UpdateCohort};

const COLUMNS: &str = "id, organization_id, name, created_at, updated_at";

/// Outcome of [`CohortRepo::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortDeletion {
    Deleted,
    NotFound,
    /// The cohort still has this many active participants; nothing was deleted.
    HasActiveParticipants(i64),
}

pub struct CohortRepo;

impl CohortRepo {
    pub async fn create(pool: &PgPool, input: &CreateCohort) -> Result<Cohort, sqlx::Error> {
        let query = format!(
            "INSERT INTO cohorts (organization_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cohort>(&query)
            .bind(input.organization_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cohort>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cohorts WHERE id = $1");
        sqlx::query_as::<_, Cohort>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Cohort>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM cohorts WHERE organization_id = $1 ORDER BY name");
        sqlx::query_as::<_, Cohort>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCohort,
    ) -> Result<Option<Cohort>, sqlx::Error> {
        let query = format!(
            "UPDATE cohorts SET name = COALESCE($2, name) WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cohort>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a cohort unless active participants are still assigned to it.
    ///
    /// Inactive participants are detached (their `cohort_id` cleared) in the
    /// same transaction as the delete.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<CohortDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM cohorts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(CohortDeletion::NotFound);
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participants WHERE cohort_id = $1 AND is_active = true",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return Ok(CohortDeletion::HasActiveParticipants(active));
        }

        sqlx::query("UPDATE participants SET cohort_id = NULL WHERE cohort_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cohorts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CohortDeletion::Deleted)
    }
}
