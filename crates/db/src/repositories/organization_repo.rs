//! Repository for the `organizations` table.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::organization::{
    CreateOrganization, Organization, OrganizationDeletion, OrganizationSummary,
    UpdateOrganization,
};

const COLUMNS: &str = "id, name, created_at, updated_at";

pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateOrganization,
    ) -> Result<Organization, sqlx::Error> {
        let query = format!("INSERT INTO organizations (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Organization>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List organizations with member and participant counts, by name.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<OrganizationSummary>, sqlx::Error> {
        sqlx::query_as::<_, OrganizationSummary>(
            "SELECT o.id, o.name,
                    (SELECT COUNT(*) FROM memberships m WHERE m.organization_id = o.id) AS member_count,
                    (SELECT COUNT(*) FROM participants p WHERE p.organization_id = o.id) AS participant_count,
                    o.created_at
             FROM organizations o
             ORDER BY o.name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!(
            "UPDATE organizations SET name = COALESCE($2, name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    /// Delete an organization and everything that belongs to it.
    ///
    /// Runs in one transaction in foreign-key order: responses, attempts,
    /// invitations, participants, cohorts, memberships, then the organization.
    /// Any failure rolls back every prior delete. Returns `None` if the
    /// organization does not exist.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OrganizationDeletion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM organizations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let responses = sqlx::query(
            "DELETE FROM responses WHERE attempt_id IN (
                SELECT a.id FROM attempts a
                JOIN participants p ON p.id = a.participant_id
                WHERE p.organization_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let attempts = sqlx::query(
            "DELETE FROM attempts WHERE participant_id IN (
                SELECT id FROM participants WHERE organization_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let invitations = sqlx::query(
            "DELETE FROM invitations WHERE participant_id IN (
                SELECT id FROM participants WHERE organization_id = $1
             )",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let participants = sqlx::query("DELETE FROM participants WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let cohorts = sqlx::query("DELETE FROM cohorts WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let memberships = sqlx::query("DELETE FROM memberships WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let summary = OrganizationDeletion {
            responses,
            attempts,
            invitations,
            participants,
            cohorts,
            memberships,
        };
        tracing::info!(organization_id = id, ?summary, "Organization deleted");
        Ok(Some(summary))
    }
}
