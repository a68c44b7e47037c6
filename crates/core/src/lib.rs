//! Domain types and process-local admission services for the assessment platform.
//!
//! Nothing in this crate touches the database or HTTP. The in-memory services
//! ([`rate_limit::RateLimiter`], [`sessions::SessionManager`]) are built on
//! [`expiring::ExpiringMap`] and are meant to be owned by the API state behind `Arc`.

pub mod error;
pub mod expiring;
pub mod rate_limit;
pub mod roles;
pub mod scoring;
pub mod sessions;
pub mod sweep;
pub mod types;
