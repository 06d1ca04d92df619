//! Tree construction from a flat list of file handles

use super::filter;
use super::node::{Directory, DirectoryNode, TreeNode};
use crate::ingest::FileHandle;
use crate::types::PATH_SEPARATOR;
use tracing::{debug, warn};

/// Builds a [`Directory`] from handles whose paths share one root folder
pub struct TreeBuilder;

impl TreeBuilder {
    /// Build the tree.
    ///
    /// The root name is the first segment of the first visible handle. Hidden
    /// paths, paths under a different root, and paths with empty segments are
    /// skipped. Duplicate terminal paths resolve last-write-wins. Returns
    /// `None` when no handle survives filtering.
    pub fn build(handles: impl IntoIterator<Item = FileHandle>) -> Option<Directory> {
        let mut directory: Option<Directory> = None;
        let mut skipped_hidden = 0usize;

        for handle in handles {
            let path = handle.relative_path().to_string();
            let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();

            if filter::is_hidden(segments.iter().copied()) {
                skipped_hidden += 1;
                continue;
            }
            if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
                warn!(path = %path, "Skipping file without a usable relative path");
                continue;
            }

            let dir = directory.get_or_insert_with(|| Directory::new(segments[0]));
            if dir.name != segments[0] {
                warn!(
                    path = %path,
                    root = %dir.name,
                    "Skipping file outside the uploaded root folder"
                );
                continue;
            }

            Self::insert(&mut dir.root, &segments[1..], handle);
        }

        if skipped_hidden > 0 {
            debug!(skipped = skipped_hidden, "Skipped hidden entries");
        }
        directory
    }

    /// Insert a handle at `segments` below `root`, creating collapsed
    /// directories for intermediate segments.
    fn insert(root: &mut DirectoryNode, segments: &[&str], handle: FileHandle) {
        let Some((file_name, dirs)) = segments.split_last() else {
            return;
        };
        let mut current = root;
        for segment in dirs {
            current = current
                .children
                .entry((*segment).to_string())
                .or_insert_with(|| TreeNode::Directory(DirectoryNode::new()))
                .ensure_directory();
        }
        current
            .children
            .insert((*file_name).to_string(), TreeNode::File(handle));
    }
}
