//! Organization (tenant) and membership models.

use assessment_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Organization with aggregate counts, used by admin listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganizationSummary {
    pub id: DbId,
    pub name: String,
    pub member_count: i64,
    pub participant_count: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
}

/// A row from the `memberships` table joined with the member's identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub membership_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub full_name: String,
    pub joined_at: Timestamp,
}

/// Row counts removed by a cascading organization delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationDeletion {
    pub responses: u64,
    pub attempts: u64,
    pub invitations: u64,
    pub participants: u64,
    pub cohorts: u64,
    pub memberships: u64,
}
