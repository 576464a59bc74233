//! Domain types and rules for the project tree.
//!
//! Nothing in this crate touches the database or the network; `db`, `events`
//! and `api` build on these types.

pub mod codes;
pub mod error;
pub mod naming;
pub mod node;
pub mod progress;
pub mod tree;
pub mod types;
