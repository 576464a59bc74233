//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or an open transaction) as the first argument.

pub mod candidate_repo;
pub mod member_repo;
pub mod node_repo;
pub mod node_tree_repo;
pub mod workspace_repo;

pub use candidate_repo::CandidateRepo;
pub use member_repo::MemberRepo;
pub use node_repo::NodeRepo;
pub use node_tree_repo::NodeTreeRepo;
pub use workspace_repo::WorkspaceRepo;
