//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod assessment;
pub mod attempt;
pub mod cohort;
pub mod organization;
pub mod participant;
pub mod role;
pub mod user;
