//! The organizer session: the current forest, the selection, and the
//! user-facing actions that mutate them.
//!
//! Every mutation builds a new forest and goes through [`Session::commit`],
//! which publishes it, saves it, and reconciles the selection so it never
//! refers to a node that is gone.

use chrono::Utc;

use crate::error::{ActionError, Result};
use crate::id::IdSource;
use crate::store::Persistence;
use crate::tree::{FileNode, FolderNode, Forest, TreeItem};
use crate::upload::{FileDescriptor, UploadBatch};

pub struct Session {
    forest: Forest,
    persistence: Persistence,
    ids: Box<dyn IdSource>,
    selected: Option<String>,
    uploading: bool,
    /// Error from the most recent save, if it failed.
    last_save_error: Option<String>,
}

impl Session {
    /// Load (or seed) the forest from `persistence`.
    pub fn open(mut persistence: Persistence, ids: Box<dyn IdSource>) -> Self {
        let forest = persistence.load();
        Self {
            forest,
            persistence,
            ids,
            selected: None,
            uploading: false,
            last_save_error: None,
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Take the error left by the last failed save, if any.
    pub fn take_save_error(&mut self) -> Option<String> {
        self.last_save_error.take()
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected node as it exists in the current forest.
    pub fn selected_item(&self) -> Option<&TreeItem> {
        self.selected.as_deref().and_then(|id| self.forest.find(id))
    }

    /// Select `id`. Ids that do not resolve clear the selection.
    pub fn select_item(&mut self, id: &str) {
        self.selected = self.forest.contains(id).then(|| id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ── Actions ─────────────────────────────────────────────────────────

    /// Create a folder under `parent_id`, or at the root when `None`.
    ///
    /// Returns the new folder's id, or `None` if the parent no longer exists.
    pub fn create_folder(
        &mut self,
        parent_id: Option<&str>,
        name: &str,
    ) -> std::result::Result<Option<String>, ActionError> {
        let name = validate_name(name)?;
        let id = self.fresh_id();
        let folder = TreeItem::folder(FolderNode::new(id.clone(), name));
        let next = self.forest.insert_into(parent_id, folder);
        let created = next.contains(&id);
        self.commit(next);
        if created {
            tracing::info!(%id, parent = parent_id.unwrap_or("<root>"), name, "folder created");
            Ok(Some(id))
        } else {
            tracing::debug!(parent = parent_id.unwrap_or("<root>"), "create target vanished");
            Ok(None)
        }
    }

    pub fn rename_item(&mut self, id: &str, name: &str) -> std::result::Result<(), ActionError> {
        let name = validate_name(name)?;
        let next = self.forest.update_node(id, |item| item.renamed(name));
        tracing::info!(id, name, "item renamed");
        self.commit(next);
        Ok(())
    }

    /// Remove `id` and everything under it. Callers confirm with the user first.
    pub fn delete_item(&mut self, id: &str) {
        let before = self.forest.len();
        let next = self.forest.remove_node(id);
        tracing::info!(id, removed = before - next.len(), "item deleted");
        self.commit(next);
    }

    /// Flip the expansion flag of folder `id`.
    pub fn toggle_expand(&mut self, id: &str) {
        let next = self.forest.update_node(id, TreeItem::toggled);
        self.commit(next);
    }

    /// Set the expansion flag of folder `id`.
    pub fn set_expanded(&mut self, id: &str, expanded: bool) {
        let next = self.forest.update_node(id, |item| item.with_expanded(expanded));
        self.commit(next);
    }

    /// Root folders whose name contains `term`.
    pub fn search_folders(&self, term: &str) -> Vec<&TreeItem> {
        self.forest.search_roots(term)
    }

    /// Validate an upload of `descriptors` into the selected folder and mark
    /// the session as uploading. Nothing else changes until
    /// [`Session::complete_upload`].
    pub fn begin_upload(
        &mut self,
        descriptors: Vec<FileDescriptor>,
    ) -> std::result::Result<UploadBatch, ActionError> {
        if self.uploading {
            return Err(ActionError::UploadInProgress);
        }
        let target_id = match self.selected_item() {
            Some(TreeItem::Folder(folder)) => folder.id.clone(),
            _ => {
                tracing::info!("upload rejected: no folder selected");
                return Err(ActionError::InvalidUploadTarget);
            }
        };
        if descriptors.is_empty() {
            return Err(ActionError::NoFiles);
        }
        self.uploading = true;
        Ok(UploadBatch {
            target_id,
            descriptors,
        })
    }

    /// Insert the batch's files into its target folder as it exists now.
    ///
    /// Files get fresh ids and a completion-time upload date, and are
    /// appended in descriptor order. If the target has been deleted the
    /// forest is left unchanged. Returns the number of files inserted.
    pub fn complete_upload(&mut self, batch: UploadBatch) -> usize {
        self.uploading = false;
        let upload_date = Utc::now();

        let mut next = self.forest.clone();
        let mut inserted = 0;
        for descriptor in batch.descriptors {
            let id = self.fresh_id_in(&next);
            let file = TreeItem::file(FileNode {
                id: id.clone(),
                name: descriptor.name,
                size: descriptor.size,
                upload_date,
                mime_type: descriptor.mime_type,
            });
            next = next.insert_into(Some(&batch.target_id), file);
            if next.contains(&id) {
                inserted += 1;
            }
        }

        if inserted == 0 {
            tracing::info!(target_id = %batch.target_id, "upload target vanished, nothing inserted");
            return 0;
        }
        tracing::info!(target_id = %batch.target_id, files = inserted, "upload completed");
        self.commit(next);
        inserted
    }

    /// Replace the forest with a fresh seed.
    pub fn reset(&mut self) -> Result<()> {
        let forest = self.persistence.reset()?;
        self.forest = forest;
        self.reconcile_selection();
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Publish `next`, save it, and drop a selection that no longer resolves.
    fn commit(&mut self, next: Forest) {
        self.forest = next;
        if let Err(e) = self.persistence.save(&self.forest) {
            tracing::error!(error = %e, "failed to save forest");
            self.last_save_error = Some(e.to_string());
        }
        self.reconcile_selection();
    }

    fn reconcile_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !self.forest.contains(id) {
                tracing::debug!(%id, "selected item removed, clearing selection");
                self.selected = None;
            }
        }
    }

    fn fresh_id(&mut self) -> String {
        let forest = self.forest.clone();
        self.fresh_id_in(&forest)
    }

    /// Draw ids until one is not already used in `forest`.
    fn fresh_id_in(&mut self, forest: &Forest) -> String {
        loop {
            let id = self.ids.next_id();
            if !forest.contains(&id) {
                return id;
            }
            tracing::warn!(%id, "id source produced a duplicate, drawing again");
        }
    }
}

/// Trim `name`, rejecting blank input.
pub fn validate_name(name: &str) -> std::result::Result<&str, ActionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ActionError::EmptyName)
    } else {
        Ok(trimmed)
    }
}
