//! Tree node types

use super::walker::{self, Walk};
use crate::ingest::FileHandle;
use crate::types::PATH_SEPARATOR;
use std::collections::BTreeMap;

/// A node in an ingested source tree: exactly one of file or directory
#[derive(Debug, Clone)]
pub enum TreeNode {
    File(FileHandle),
    Directory(DirectoryNode),
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        matches!(self, TreeNode::File(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::File(_) => None,
        }
    }

    /// Replace a file node with an empty collapsed directory (last write wins)
    /// and return the directory.
    pub(crate) fn ensure_directory(&mut self) -> &mut DirectoryNode {
        if self.is_file() {
            *self = TreeNode::Directory(DirectoryNode::default());
        }
        match self {
            TreeNode::Directory(dir) => dir,
            TreeNode::File(_) => unreachable!("file node was replaced above"),
        }
    }
}

/// Directory: child name -> node, plus the view-state expansion flag
///
/// Keys are single path segments.
#[derive(Debug, Clone, Default)]
pub struct DirectoryNode {
    pub children: BTreeMap<String, TreeNode>,
    pub expanded: bool,
}

impl DirectoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Root of one ingested upload
///
/// The root directory's expansion state lives in `expanded`; the flag on
/// `root` itself is not consulted.
#[derive(Debug, Clone)]
pub struct Directory {
    pub name: String,
    pub root: DirectoryNode,
    pub expanded: bool,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: DirectoryNode::new(),
            expanded: false,
        }
    }

    /// Every file in the tree with its full relative path (root name first).
    pub fn files(&self) -> Walk<'_> {
        walker::walk_directory(&self.root, &self.name)
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Look up a node by full relative path. The root itself has no node.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut segments = path.split(PATH_SEPARATOR);
        if segments.next() != Some(self.name.as_str()) {
            return None;
        }
        let mut dir = &self.root;
        let mut found: Option<&TreeNode> = None;
        for segment in segments {
            if let Some(node) = found {
                dir = node.as_directory()?;
            }
            found = Some(dir.children.get(segment)?);
        }
        found
    }

    /// Expansion flag of the root (path == name) or a nested directory.
    pub fn is_expanded(&self, path: &str) -> Option<bool> {
        if path == self.name {
            return Some(self.expanded);
        }
        self.find(path)?.as_directory().map(|dir| dir.expanded)
    }

    /// Flip the expansion flag of the root (path == name) or a nested directory.
    ///
    /// Returns false when the path does not name a directory.
    pub fn toggle_expanded(&mut self, path: &str) -> bool {
        let mut segments = path.split(PATH_SEPARATOR);
        if segments.next() != Some(self.name.as_str()) {
            return false;
        }
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            self.expanded = !self.expanded;
            return true;
        }
        let mut current = &mut self.root;
        for segment in rest {
            match current.children.get_mut(segment) {
                Some(TreeNode::Directory(dir)) => current = dir,
                _ => return false,
            }
        }
        current.expanded = !current.expanded;
        true
    }
}
