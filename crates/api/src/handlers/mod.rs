pub mod admin;
pub mod assessment;
pub mod auth;
pub mod org_portal;
pub mod organization;
pub mod participate;
