//! Repository for the `participants` table.

use assessment_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::participant::{CreateParticipant, Invitation, Participant};
use crate::repositories::invitation_repo::INVITATION_COLUMNS;

const COLUMNS: &str =
    "id, organization_id, cohort_id, email, full_name, is_active, created_at, updated_at";

pub struct ParticipantRepo;

impl ParticipantRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateParticipant,
    ) -> Result<Participant, sqlx::Error> {
        let query = format!(
            "INSERT INTO participants (organization_id, cohort_id, email, full_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(input.organization_id)
            .bind(input.cohort_id)
            .bind(&input.email)
            .bind(&input.full_name)
            .fetch_one(pool)
            .await
    }

    /// Insert a participant together with their first invitation.
    ///
    /// Both rows are written in one transaction, so a failed invitation never
    /// leaves a participant behind.
    pub async fn create_with_invitation(
        pool: &PgPool,
        input: &CreateParticipant,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(Participant, Invitation), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO participants (organization_id, cohort_id, email, full_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let participant = sqlx::query_as::<_, Participant>(&query)
            .bind(input.organization_id)
            .bind(input.cohort_id)
            .bind(&input.email)
            .bind(&input.full_name)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO invitations (participant_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {INVITATION_COLUMNS}"
        );
        let invitation = sqlx::query_as::<_, Invitation>(&query)
            .bind(participant.id)
            .bind(token_hash)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((participant, invitation))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Participant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM participants WHERE id = $1");
        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participants WHERE organization_id = $1
             ORDER BY full_name, id"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Toggle a participant's active flag. Returns the updated row.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<Participant>, sqlx::Error> {
        let query =
            format!("UPDATE participants SET is_active = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }
}
