use assessment_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cohorts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cohort {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateCohort {
    pub organization_id: DbId,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCohort {
    pub name: Option<String>,
}
