//! Participant and invitation models.

use assessment_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub organization_id: DbId,
    pub cohort_id: Option<DbId>,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateParticipant {
    pub organization_id: DbId,
    pub cohort_id: Option<DbId>,
    pub email: String,
    pub full_name: String,
}

/// A row from the `invitations` table.
///
/// Only the SHA-256 hash of the token is stored; the plaintext is handed to
/// the inviter once and never persisted.
#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub id: DbId,
    pub participant_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
