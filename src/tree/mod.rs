//! Source Tree
//!
//! Hierarchical view of an ingested directory: hidden-entry filtering,
//! construction from flat handles, and traversal back to flat pairs.

pub mod builder;
pub mod external;
pub mod filter;
pub mod node;
pub mod walker;

pub use builder::TreeBuilder;
pub use external::ExternalNode;
pub use node::{Directory, DirectoryNode, TreeNode};
pub use walker::{walk, walk_directory, Walk};
