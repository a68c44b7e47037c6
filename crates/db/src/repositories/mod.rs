//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Deletes that span several
//! tables run in a single transaction, children before parents.

pub mod assessment_repo;
pub mod attempt_repo;
pub mod cohort_repo;
pub mod invitation_repo;
pub mod membership_repo;
pub mod organization_repo;
pub mod participant_repo;
pub mod question_repo;
pub mod report_repo;
pub mod response_repo;
pub mod role_repo;
pub mod user_repo;

pub use assessment_repo::AssessmentRepo;
pub use attempt_repo::AttemptRepo;
pub use cohort_repo::{CohortDeletion, CohortRepo};
pub use invitation_repo::InvitationRepo;
pub use membership_repo::MembershipRepo;
pub use organization_repo::OrganizationRepo;
pub use participant_repo::ParticipantRepo;
pub use question_repo::QuestionRepo;
pub use report_repo::ReportRepo;
pub use response_repo::ResponseRepo;
pub use role_repo::RoleRepo;
pub use user_repo::UserRepo;
