//! Authentication primitives.
//!
//! - [`password`]: Argon2id password hashing, verification and strength rules.
//! - [`jwt`]: access-token generation and validation.
//! - [`invitation`]: opaque participant invitation tokens.

pub mod invitation;
pub mod jwt;
pub mod password;
