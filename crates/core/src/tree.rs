//! Reconstruction of a nested tree from flat closure-table rows.
//!
//! The store hands back two flat sets: the direct parent links of a subtree
//! (closure rows with `depth = 1`) and the node rows themselves. [`assemble`]
//! turns them into a [`TreeNode`] hierarchy rooted at a given id.
//!
//! Each node is moved out of the lookup map the first time it is placed, so
//! assembly visits every node at most once and always terminates, even on
//! malformed input. Links whose child row is missing (for example a
//! soft-deleted node) prune that child's whole branch.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::DbId;

/// A node plus its materialized children, in link order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub node: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    pub fn leaf(node: T) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// A direct parent → child link (a closure row with `depth = 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub parent_id: DbId,
    pub child_id: DbId,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Root node {0} is not among the loaded nodes")]
    MissingRoot(DbId),
}

/// Build the nested tree under `root_id`.
///
/// `links` must be in the order children should appear; sibling order is
/// never re-sorted here. Nodes that are not reachable from `root_id` are
/// ignored.
pub fn assemble<T>(
    root_id: DbId,
    links: &[ParentLink],
    mut nodes: HashMap<DbId, T>,
) -> Result<TreeNode<T>, TreeError> {
    let mut index: HashMap<DbId, Vec<DbId>> = HashMap::new();
    for link in links {
        index.entry(link.parent_id).or_default().push(link.child_id);
    }

    build(root_id, &index, &mut nodes).ok_or(TreeError::MissingRoot(root_id))
}

fn build<T>(
    id: DbId,
    index: &HashMap<DbId, Vec<DbId>>,
    nodes: &mut HashMap<DbId, T>,
) -> Option<TreeNode<T>> {
    let node = nodes.remove(&id)?;
    let children = match index.get(&id) {
        Some(child_ids) => child_ids
            .iter()
            .filter_map(|child| build(*child, index, nodes))
            .collect(),
        None => Vec::new(),
    };
    Some(TreeNode { node, children })
}
