//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the current member, resolved from a JWT Bearer token.

pub mod auth;
