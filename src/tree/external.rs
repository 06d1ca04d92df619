//! Externally supplied roots
//!
//! Callers at the ingestion boundary may hand over aggregates that are not
//! tagged as directories, only keyed containers. This is the single place
//! where that shape is accepted; it is converted into the canonical
//! [`TreeNode`] immediately.

use super::filter;
use super::node::{Directory, DirectoryNode, TreeNode};
use crate::error::ApiError;
use crate::ingest::FileHandle;
use std::collections::BTreeMap;

/// Node as supplied from outside the core
#[derive(Debug, Clone)]
pub enum ExternalNode {
    File(FileHandle),
    Directory {
        children: BTreeMap<String, ExternalNode>,
        expanded: bool,
    },
    /// Keyed container without a directory tag
    Container(BTreeMap<String, ExternalNode>),
}

impl ExternalNode {
    /// Convert to the canonical tree. Containers become collapsed directories;
    /// hidden keys are dropped.
    pub fn into_tree_node(self) -> TreeNode {
        match self {
            ExternalNode::File(handle) => TreeNode::File(handle),
            ExternalNode::Directory { children, expanded } => {
                TreeNode::Directory(convert_children(children, expanded))
            }
            ExternalNode::Container(children) => {
                TreeNode::Directory(convert_children(children, false))
            }
        }
    }
}

fn convert_children(children: BTreeMap<String, ExternalNode>, expanded: bool) -> DirectoryNode {
    DirectoryNode {
        children: children
            .into_iter()
            .filter(|(name, _)| !filter::is_hidden_segment(name))
            .map(|(name, child)| (name, child.into_tree_node()))
            .collect(),
        expanded,
    }
}

impl Directory {
    /// Build a directory from an externally supplied root.
    pub fn from_external(name: impl Into<String>, root: ExternalNode) -> Result<Self, ApiError> {
        let name = name.into();
        match root.into_tree_node() {
            TreeNode::Directory(dir) => Ok(Directory {
                name,
                root: dir,
                expanded: false,
            }),
            TreeNode::File(_) => Err(ApiError::Precondition(format!(
                "root '{}' is a file, expected a directory",
                name
            ))),
        }
    }
}
