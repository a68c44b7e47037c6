//! Repository for the `memberships` table (organization users).

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::organization::{Member, Organization};

pub struct MembershipRepo;

impl MembershipRepo {
    /// Add `user_id` to `organization_id`. Adding an existing member is a no-op.
    pub async fn add(pool: &PgPool, organization_id: DbId, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO memberships (organization_id, user_id) VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_memberships_org_user DO NOTHING",
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a membership. Returns `true` if a row was deleted.
    pub async fn remove(
        pool: &PgPool,
        organization_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM memberships WHERE organization_id = $1 AND user_id = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_member(
        pool: &PgPool,
        organization_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM memberships WHERE organization_id = $1 AND user_id = $2
             )",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Members of an organization, by name.
    pub async fn list_members(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "SELECT m.id AS membership_id, u.id AS user_id, u.email, u.full_name,
                    m.created_at AS joined_at
             FROM memberships m
             JOIN users u ON u.id = m.user_id
             WHERE m.organization_id = $1
             ORDER BY u.full_name, u.id",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Organizations a user belongs to, by name.
    pub async fn list_organizations_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Organization>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            "SELECT o.id, o.name, o.created_at, o.updated_at
             FROM organizations o
             JOIN memberships m ON m.organization_id = o.id
             WHERE m.user_id = $1
             ORDER BY o.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
