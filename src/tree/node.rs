use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type used when the source does not report one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A leaf entry: an uploaded file's metadata. No bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

/// A folder and its ordered children (insertion order is display order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeItem>,
    #[serde(default)]
    pub is_expanded: bool,
}

impl FolderNode {
    /// A new, empty, collapsed folder.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
            is_expanded: false,
        }
    }

    /// Builder-style helper used by the seed and tests.
    pub fn with_children(mut self, children: Vec<TreeItem>) -> Self {
        self.children = children;
        self
    }
}

/// A node in the tree.
///
/// Cloning an item clones an `Arc`, so unchanged subtrees are shared between
/// the forest before and after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeItem {
    File(Arc<FileNode>),
    Folder(Arc<FolderNode>),
}

impl TreeItem {
    pub fn file(node: FileNode) -> Self {
        TreeItem::File(Arc::new(node))
    }

    pub fn folder(node: FolderNode) -> Self {
        TreeItem::Folder(Arc::new(node))
    }

    pub fn id(&self) -> &str {
        match self {
            TreeItem::File(f) => &f.id,
            TreeItem::Folder(f) => &f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeItem::File(f) => &f.name,
            TreeItem::Folder(f) => &f.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, TreeItem::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            TreeItem::Folder(f) => Some(f),
            TreeItem::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            TreeItem::File(f) => Some(f),
            TreeItem::Folder(_) => None,
        }
    }

    /// Display label for the item kind ("File" / "Folder").
    pub fn kind_label(&self) -> &'static str {
        match self {
            TreeItem::File(_) => "File",
            TreeItem::Folder(_) => "Folder",
        }
    }

    /// Copy of this item with a new name; children are shared.
    pub fn renamed(&self, name: &str) -> TreeItem {
        match self {
            TreeItem::File(f) => TreeItem::file(FileNode {
                name: name.to_string(),
                ..FileNode::clone(f)
            }),
            TreeItem::Folder(f) => TreeItem::folder(FolderNode {
                name: name.to_string(),
                ..FolderNode::clone(f)
            }),
        }
    }

    /// Copy of this item with its expansion flag flipped. Files come back unchanged.
    pub fn toggled(&self) -> TreeItem {
        match self {
            TreeItem::File(_) => self.clone(),
            TreeItem::Folder(f) => TreeItem::folder(FolderNode {
                is_expanded: !f.is_expanded,
                ..FolderNode::clone(f)
            }),
        }
    }

    /// Copy of this item with its expansion flag set.
    pub fn with_expanded(&self, expanded: bool) -> TreeItem {
        match self {
            TreeItem::Folder(f) if f.is_expanded != expanded => TreeItem::folder(FolderNode {
                is_expanded: expanded,
                ..FolderNode::clone(f)
            }),
            _ => self.clone(),
        }
    }
}
