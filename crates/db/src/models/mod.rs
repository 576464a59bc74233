//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the table, plus the input DTOs the repositories accept.

pub mod candidate;
pub mod member;
pub mod node;
pub mod node_tree;
pub mod workspace;
