use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::node::{FolderNode, TreeItem};

/// The whole tree: an ordered sequence of root folders.
///
/// A `Forest` is a value. Every mutating operation returns a new forest and
/// leaves `self` untouched; only the ancestor chain of the affected node is
/// rebuilt, every other subtree is shared by `Arc`.
///
/// Operations targeting an id that does not resolve are no-ops. If the
/// unique-id invariant is ever violated, operations act on the first
/// pre-order match and leave later duplicates untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<TreeItem>", try_from = "Vec<TreeItem>")]
pub struct Forest {
    roots: Vec<TreeItem>,
}

/// Error returned when a decoded forest has a file at the root level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("file '{0}' found at root level")]
pub struct FileAtRoot(pub String);

impl TryFrom<Vec<TreeItem>> for Forest {
    type Error = FileAtRoot;

    fn try_from(roots: Vec<TreeItem>) -> Result<Self, Self::Error> {
        if let Some(file) = roots.iter().find(|item| !item.is_folder()) {
            return Err(FileAtRoot(file.id().to_string()));
        }
        Ok(Self { roots })
    }
}

impl From<Forest> for Vec<TreeItem> {
    fn from(forest: Forest) -> Self {
        forest.roots
    }
}

impl FromIterator<FolderNode> for Forest {
    fn from_iter<I: IntoIterator<Item = FolderNode>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().map(TreeItem::folder).collect(),
        }
    }
}

impl Forest {
    /// The root-level items (always folders).
    pub fn roots(&self) -> &[TreeItem] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        fn count(items: &[TreeItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    TreeItem::File(_) => 1,
                    TreeItem::Folder(f) => 1 + count(&f.children),
                })
                .sum()
        }
        count(&self.roots)
    }

    /// Depth-first pre-order search, independent of expansion state.
    pub fn find(&self, id: &str) -> Option<&TreeItem> {
        fn find_in<'a>(items: &'a [TreeItem], id: &str) -> Option<&'a TreeItem> {
            for item in items {
                if item.id() == id {
                    return Some(item);
                }
                if let TreeItem::Folder(folder) = item {
                    if let Some(found) = find_in(&folder.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find_in(&self.roots, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Every id in pre-order.
    pub fn ids(&self) -> Vec<&str> {
        fn collect<'a>(items: &'a [TreeItem], out: &mut Vec<&'a str>) {
            for item in items {
                out.push(item.id());
                if let TreeItem::Folder(folder) = item {
                    collect(&folder.children, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.roots, &mut out);
        out
    }

    /// Names from the root folder down to the node with `id`, inclusive.
    pub fn path_to(&self, id: &str) -> Option<Vec<&str>> {
        fn walk<'a>(items: &'a [TreeItem], id: &str, path: &mut Vec<&'a str>) -> bool {
            for item in items {
                path.push(item.name());
                if item.id() == id {
                    return true;
                }
                if let TreeItem::Folder(folder) = item {
                    if walk(&folder.children, id, path) {
                        return true;
                    }
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.roots, id, &mut path).then_some(path)
    }

    /// Replace the node with `id` by `update(node)`.
    ///
    /// A root-level replacement that is not a folder is refused.
    pub fn update_node<F>(&self, id: &str, update: F) -> Forest
    where
        F: FnOnce(&TreeItem) -> TreeItem,
    {
        let mut update = Some(update);
        match update_in(&self.roots, id, &mut update, true) {
            Some(roots) => Forest { roots },
            None => self.clone(),
        }
    }

    /// Append `node` to the children of folder `parent_id`, or at the root
    /// when `parent_id` is `None`.
    ///
    /// Only folders are accepted at the root. An unresolved parent, or a
    /// parent id naming a file, leaves the forest unchanged.
    pub fn insert_into(&self, parent_id: Option<&str>, node: TreeItem) -> Forest {
        let Some(parent_id) = parent_id.filter(|id| !id.is_empty()) else {
            if !node.is_folder() {
                tracing::warn!(id = node.id(), "refusing to insert a file at the root level");
                return self.clone();
            }
            let mut roots = self.roots.clone();
            roots.push(node);
            return Forest { roots };
        };

        let mut node = Some(node);
        match insert_in(&self.roots, parent_id, &mut node) {
            Some(roots) => Forest { roots },
            None => self.clone(),
        }
    }

    /// Remove the node with `id` and its whole subtree.
    pub fn remove_node(&self, id: &str) -> Forest {
        match remove_in(&self.roots, id) {
            Some(roots) => Forest { roots },
            None => self.clone(),
        }
    }

    /// Root folders whose name contains `term`, case-insensitively.
    ///
    /// Nested folders and files are never matched.
    pub fn search_roots(&self, term: &str) -> Vec<&TreeItem> {
        let term = term.to_lowercase();
        self.roots
            .iter()
            .filter(|item| item.name().to_lowercase().contains(&term))
            .collect()
    }
}

// The helpers below return `Some(new_items)` only when something changed,
// so untouched levels keep their original `Arc`s.

fn update_in<F>(
    items: &[TreeItem],
    id: &str,
    update: &mut Option<F>,
    at_root: bool,
) -> Option<Vec<TreeItem>>
where
    F: FnOnce(&TreeItem) -> TreeItem,
{
    for (index, item) in items.iter().enumerate() {
        if item.id() == id {
            let update = update.take()?;
            let replacement = update(item);
            if at_root && !replacement.is_folder() {
                tracing::warn!(id, "refusing to replace a root folder with a file");
                return None;
            }
            return Some(replace_at(items, index, replacement));
        }
        if let TreeItem::Folder(folder) = item {
            if let Some(children) = update_in(&folder.children, id, update, false) {
                return Some(replace_at(items, index, rebuild(folder, children)));
            }
            if update.is_none() {
                return None;
            }
        }
    }
    None
}

fn insert_in(items: &[TreeItem], parent_id: &str, node: &mut Option<TreeItem>) -> Option<Vec<TreeItem>> {
    for (index, item) in items.iter().enumerate() {
        match item {
            TreeItem::Folder(folder) if folder.id == parent_id => {
                let mut children = folder.children.clone();
                children.push(node.take()?);
                return Some(replace_at(items, index, rebuild(folder, children)));
            }
            // First pre-order match is a file: nothing to insert into.
            TreeItem::File(file) if file.id == parent_id => {
                node.take();
                return None;
            }
            TreeItem::Folder(folder) => {
                if let Some(children) = insert_in(&folder.children, parent_id, node) {
                    return Some(replace_at(items, index, rebuild(folder, children)));
                }
                if node.is_none() {
                    return None;
                }
            }
            TreeItem::File(_) => {}
        }
    }
    None
}

fn remove_in(items: &[TreeItem], id: &str) -> Option<Vec<TreeItem>> {
    for (index, item) in items.iter().enumerate() {
        if item.id() == id {
            let mut remaining = items.to_vec();
            remaining.remove(index);
            return Some(remaining);
        }
        if let TreeItem::Folder(folder) = item {
            if let Some(children) = remove_in(&folder.children, id) {
                return Some(replace_at(items, index, rebuild(folder, children)));
            }
        }
    }
    None
}

fn replace_at(items: &[TreeItem], index: usize, replacement: TreeItem) -> Vec<TreeItem> {
    let mut out = items.to_vec();
    out[index] = replacement;
    out
}

fn rebuild(folder: &Arc<FolderNode>, children: Vec<TreeItem>) -> TreeItem {
    TreeItem::folder(FolderNode {
        id: folder.id.clone(),
        name: folder.name.clone(),
        children,
        is_expanded: folder.is_expanded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::FileNode;
    use chrono::Utc;

    fn folder(id: &str, children: Vec<TreeItem>) -> TreeItem {
        TreeItem::folder(FolderNode::new(id, id.to_uppercase()).with_children(children))
    }

    fn file(id: &str, size: u64) -> TreeItem {
        TreeItem::file(FileNode {
            id: id.into(),
            name: format!("{id}.pdf"),
            size,
            upload_date: Utc::now(),
            mime_type: "application/pdf".into(),
        })
    }

    /// a
    /// ├── b
    /// │   ├── c
    /// │   └── x (file)
    /// └── d
    /// e
    fn sample() -> Forest {
        Forest::try_from(vec![
            folder(
                "a",
                vec![folder("b", vec![folder("c", vec![]), file("x", 10)]), folder("d", vec![])],
            ),
            folder("e", vec![]),
        ])
        .unwrap()
    }

    fn child_ids(forest: &Forest, id: &str) -> Vec<String> {
        forest
            .find(id)
            .and_then(TreeItem::as_folder)
            .map(|f| f.children.iter().map(|c| c.id().to_string()).collect())
            .unwrap_or_default()
    }

    fn folder_arc<'a>(forest: &'a Forest, id: &str) -> &'a Arc<FolderNode> {
        match forest.find(id) {
            Some(TreeItem::Folder(f)) => f,
            _ => panic!("{id} is not a folder"),
        }
    }

    #[test]
    fn find_reaches_collapsed_descendants() {
        let forest = sample();
        assert!(!folder_arc(&forest, "b").is_expanded);
        assert_eq!(forest.find("c").map(TreeItem::id), Some("c"));
        assert_eq!(forest.find("x").map(TreeItem::name), Some("x.pdf"));
        assert!(forest.find("zzz").is_none());
    }

    #[test]
    fn ids_are_pre_order() {
        assert_eq!(sample().ids(), vec!["a", "b", "c", "x", "d", "e"]);
        assert_eq!(sample().len(), 6);
    }

    #[test]
    fn path_to_lists_ancestor_names() {
        let forest = sample();
        assert_eq!(forest.path_to("c"), Some(vec!["A", "B", "C"]));
        assert_eq!(forest.path_to("e"), Some(vec!["E"]));
        assert_eq!(forest.path_to("nope"), None);
    }

    #[test]
    fn update_rebuilds_only_the_ancestor_chain() {
        let before = sample();
        let after = before.update_node("c", |item| item.renamed("Renamed"));

        assert_eq!(after.find("c").unwrap().name(), "Renamed");
        assert_eq!(before.find("c").unwrap().name(), "C");

        // Ancestors are new values, siblings are shared.
        assert!(!Arc::ptr_eq(folder_arc(&before, "a"), folder_arc(&after, "a")));
        assert!(!Arc::ptr_eq(folder_arc(&before, "b"), folder_arc(&after, "b")));
        assert!(Arc::ptr_eq(folder_arc(&before, "d"), folder_arc(&after, "d")));
        assert!(Arc::ptr_eq(folder_arc(&before, "e"), folder_arc(&after, "e")));
    }

    #[test]
    fn update_of_unknown_id_is_a_noop() {
        let forest = sample();
        let mut called = false;
        let after = forest.update_node("missing", |item| {
            called = true;
            item.clone()
        });
        assert!(!called);
        assert_eq!(after, forest);
    }

    #[test]
    fn update_refuses_file_at_root() {
        let forest = sample();
        let after = forest.update_node("e", |_| file("e", 1));
        assert_eq!(after, forest);
    }

    #[test]
    fn update_touches_only_first_duplicate() {
        let forest =
            Forest::try_from(vec![folder("a", vec![folder("dup", vec![])]), folder("dup", vec![])]).unwrap();
        let after = forest.update_node("dup", |item| item.renamed("First"));
        assert_eq!(after.roots()[0].as_folder().unwrap().children[0].name(), "First");
        assert_eq!(after.roots()[1].name(), "DUP");
    }

    #[test]
    fn toggle_changes_only_the_target_flag() {
        let forest = sample().update_node("a", TreeItem::toggled);
        let forest = forest.update_node("b", TreeItem::toggled);
        let forest = forest.update_node("c", TreeItem::toggled);
        assert!(folder_arc(&forest, "a").is_expanded);
        assert!(folder_arc(&forest, "b").is_expanded);
        assert!(folder_arc(&forest, "c").is_expanded);

        let forest = forest.update_node("b", TreeItem::toggled);
        assert!(folder_arc(&forest, "a").is_expanded);
        assert!(!folder_arc(&forest, "b").is_expanded);
        assert!(folder_arc(&forest, "c").is_expanded);
        assert!(!folder_arc(&forest, "d").is_expanded);
    }

    #[test]
    fn insert_appends_after_existing_children() {
        let forest = sample()
            .insert_into(Some("b"), file("y", 1))
            .insert_into(Some("b"), file("z", 2));
        assert_eq!(child_ids(&forest, "b"), vec!["c", "x", "y", "z"]);
    }

    #[test]
    fn insert_without_parent_appends_root_folder() {
        let forest = sample().insert_into(None, folder("f", vec![]));
        let roots: Vec<&str> = forest.roots().iter().map(TreeItem::id).collect();
        assert_eq!(roots, vec!["a", "e", "f"]);

        let same = sample().insert_into(Some(""), folder("g", vec![]));
        assert!(same.contains("g"));
    }

    #[test]
    fn insert_refuses_file_at_root() {
        let forest = sample();
        assert_eq!(forest.insert_into(None, file("y", 1)), forest);
    }

    #[test]
    fn insert_into_unknown_or_file_parent_is_a_noop() {
        let forest = sample();
        assert_eq!(forest.insert_into(Some("missing"), file("y", 1)), forest);
        assert_eq!(forest.insert_into(Some("x"), file("y", 1)), forest);
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let forest = sample().remove_node("b");
        for id in ["b", "c", "x"] {
            assert!(!forest.contains(id), "{id} should be gone");
        }
        assert_eq!(child_ids(&forest, "a"), vec!["d"]);
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn remove_root_folder() {
        let forest = sample().remove_node("a");
        assert_eq!(forest.ids(), vec!["e"]);
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let forest = sample();
        assert_eq!(forest.remove_node("missing"), forest);
    }

    #[test]
    fn old_value_survives_removal() {
        let before = sample();
        let _after = before.remove_node("a");
        assert!(before.contains("x"));
        assert_eq!(before.len(), 6);
    }

    #[test]
    fn search_matches_roots_only_case_insensitively() {
        let forest = Forest::try_from(vec![
            folder("y1", vec![folder("se", vec![])]).renamed("1st Year"),
            folder("y2", vec![]).renamed("2nd Year"),
        ])
        .unwrap()
        .update_node("se", |item| item.renamed("Software Engineering"));

        assert_eq!(forest.search_roots("YEAR").len(), 2);
        assert_eq!(forest.search_roots("1st").len(), 1);
        assert!(forest.search_roots("engineer").is_empty());
        assert_eq!(forest.search_roots("").len(), 2);
    }

    #[test]
    fn decode_rejects_file_at_root() {
        let json = r#"[{"type":"file","id":"f","name":"f","size":1,"uploadDate":"2024-01-01T00:00:00Z"}]"#;
        let err = serde_json::from_str::<Forest>(json).unwrap_err();
        assert!(err.to_string().contains("file 'f' found at root level"));

        let err: Box<dyn std::error::Error> = Box::new(FileAtRoot("x".into()));
        assert_eq!(err.to_string(), "file 'x' found at root level");
        assert_eq!(
            Forest::try_from(vec![file("x", 1)]),
            Err(FileAtRoot("x".into()))
        );
    }

    #[test]
    fn json_round_trip() {
        let forest = sample();
        let json = serde_json::to_string(&forest).unwrap();
        let back: Forest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, forest);
    }
}
