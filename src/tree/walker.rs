//! Tree traversal
//!
//! Flattens a tree or subtree back into `(FileHandle, full path)` pairs. The
//! walk is lazy and pure; restart it by calling [`walk`] again.

use super::node::{DirectoryNode, TreeNode};
use crate::ingest::FileHandle;
use crate::types::PATH_SEPARATOR;

/// Lazy depth-first iterator over the files below a node
pub struct Walk<'a> {
    stack: Vec<(&'a TreeNode, String)>,
    pending_root: Option<(&'a DirectoryNode, String)>,
}

/// Walk any node. A file node yields itself with `prefix` as its path.
pub fn walk<'a>(node: &'a TreeNode, prefix: &str) -> Walk<'a> {
    Walk {
        stack: vec![(node, prefix.to_string())],
        pending_root: None,
    }
}

/// Walk the children of a directory whose own path is `prefix`.
pub fn walk_directory<'a>(dir: &'a DirectoryNode, prefix: &str) -> Walk<'a> {
    Walk {
        stack: Vec::new(),
        pending_root: Some((dir, prefix.to_string())),
    }
}

/// Join a child name onto an accumulated path.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, name)
    }
}

impl<'a> Walk<'a> {
    fn push_children(&mut self, dir: &'a DirectoryNode, path: &str) {
        // Reversed so children pop in map order.
        for (name, child) in dir.children.iter().rev() {
            self.stack.push((child, join_path(path, name)));
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a FileHandle, String);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((dir, path)) = self.pending_root.take() {
            self.push_children(dir, &path);
        }
        while let Some((node, path)) = self.stack.pop() {
            match node {
                TreeNode::File(handle) => return Some((handle, path)),
                TreeNode::Directory(dir) => self.push_children(dir, &path),
            }
        }
        None
    }
}
