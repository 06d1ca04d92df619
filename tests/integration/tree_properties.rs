//! Properties of tree construction and traversal.

use codeplan::ingest::FileHandle;
use codeplan::tree::filter::is_visible_path;
use codeplan::tree::TreeBuilder;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,6}",
        1 => "\\.[a-z]{1,4}",
    ]
}

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4)
        .prop_map(|dirs| format!("proj/{}.py", dirs.join("/")))
}

proptest! {
    #[test]
    fn walk_returns_exactly_the_visible_paths(
        paths in prop::collection::btree_set(relative_path(), 1..24)
    ) {
        let handles: Vec<FileHandle> = paths
            .iter()
            .map(|p| FileHandle::in_memory(p.as_str(), p.as_str()))
            .collect();

        let expected: BTreeSet<String> = paths
            .iter()
            .filter(|p| is_visible_path(p))
            .cloned()
            .collect();

        match TreeBuilder::build(handles) {
            Some(directory) => {
                let walked: Vec<String> = directory.files().map(|(_, path)| path).collect();
                let unique: BTreeSet<String> = walked.iter().cloned().collect();
                prop_assert_eq!(walked.len(), unique.len());
                prop_assert_eq!(unique, expected);
                prop_assert_eq!(directory.name.as_str(), "proj");
            }
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn walked_handles_keep_their_own_path(
        paths in prop::collection::btree_set(relative_path(), 1..16)
    ) {
        let handles = paths.iter().map(|p| FileHandle::in_memory(p.as_str(), ""));
        if let Some(directory) = TreeBuilder::build(handles) {
            for (handle, path) in directory.files() {
                prop_assert_eq!(handle.relative_path(), path.as_str());
            }
        }
    }
}

#[test]
fn hidden_directory_is_excluded_from_tree() {
    let directory = TreeBuilder::build(vec![
        FileHandle::in_memory("proj/.hidden/x.py", "x"),
        FileHandle::in_memory("proj/y.py", "y"),
    ])
    .unwrap();

    let paths: Vec<String> = directory.files().map(|(_, path)| path).collect();
    assert_eq!(paths, vec!["proj/y.py"]);
    assert!(directory.find("proj/.hidden").is_none());
    assert!(!directory.expanded);
}

#[test]
fn new_directories_start_collapsed() {
    let directory = TreeBuilder::build(vec![
        FileHandle::in_memory("proj/a/b/c.py", ""),
        FileHandle::in_memory("proj/a/d.py", ""),
    ])
    .unwrap();
    assert_eq!(directory.is_expanded("proj"), Some(false));
    assert_eq!(directory.is_expanded("proj/a"), Some(false));
    assert_eq!(directory.is_expanded("proj/a/b"), Some(false));
    assert_eq!(directory.is_expanded("proj/a/d.py"), None);
}
