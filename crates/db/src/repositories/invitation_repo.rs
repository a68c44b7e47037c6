//! Repository for the `invitations` table.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::participant::Invitation;

pub(crate) const INVITATION_COLUMNS: &str =
    "id, participant_id, token_hash, expires_at, accepted_at, created_at";

pub struct InvitationRepo;

impl InvitationRepo {
    /// Find an unexpired invitation by token hash.
    pub async fn find_valid_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations
             WHERE token_hash = $1 AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Stamp `accepted_at` the first time an invitation is used.
    pub async fn mark_accepted(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE invitations SET accepted_at = NOW() WHERE id = $1 AND accepted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
