//! Authentication primitives.
//!
//! - [`jwt`] -- verification of member access tokens.

pub mod jwt;
