//! The folder/file tree: node types, the immutable forest and its
//! mutation algorithms, the default seed, and the flattened render view.

pub mod forest;
pub mod node;
pub mod seed;
pub mod view;

pub use forest::Forest;
pub use node::{FileNode, FolderNode, TreeItem, DEFAULT_MIME_TYPE};
