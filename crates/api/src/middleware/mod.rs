//! Request guards.
//!
//! - [`auth::AuthUser`]: JWT bearer token plus a live session slot.
//! - [`rbac::RequireAdmin`]: requires the `admin` role.
//! - [`rbac::require_org_access`]: admin or member of the organization.
//! - [`client_ip::ClientIp`]: best-effort caller address.
//! - [`rate_limit::throttle`]: per-client limit-class middleware.

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod rbac;
