use super::node::TreeItem;

/// Kind of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    /// Number of direct children (folders only).
    pub child_count: usize,
    /// Size in bytes (files only).
    pub size: u64,
}

/// Flatten `roots` into visible rows: pre-order, descending only into
/// expanded folders.
pub fn flatten(roots: &[&TreeItem]) -> Vec<FlatItem> {
    let mut items = Vec::new();
    for (i, root) in roots.iter().enumerate() {
        flatten_node(root, &mut items, 0, i == roots.len() - 1);
    }
    items
}

fn flatten_node(node: &TreeItem, items: &mut Vec<FlatItem>, depth: usize, is_last: bool) {
    match node {
        TreeItem::File(file) => items.push(FlatItem {
            id: file.id.clone(),
            name: file.name.clone(),
            kind: NodeKind::File,
            depth,
            is_expanded: false,
            is_last_sibling: is_last,
            child_count: 0,
            size: file.size,
        }),
        TreeItem::Folder(folder) => {
            items.push(FlatItem {
                id: folder.id.clone(),
                name: folder.name.clone(),
                kind: NodeKind::Folder,
                depth,
                is_expanded: folder.is_expanded,
                is_last_sibling: is_last,
                child_count: folder.children.len(),
                size: 0,
            });
            if folder.is_expanded {
                let count = folder.children.len();
                for (i, child) in folder.children.iter().enumerate() {
                    flatten_node(child, items, depth + 1, i == count - 1);
                }
            }
        }
    }
}
