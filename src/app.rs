use std::time::Instant;

use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::error::ActionError;
use crate::event::Event;
use crate::session::Session;
use crate::theme::ThemeColors;
use crate::tree::view::{flatten, FlatItem, NodeKind};
use crate::tree::TreeItem;
use crate::upload::{describe_paths, parse_path_list, FileDescriptor, UploadBatch, UploadOrchestrator};

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    /// New folder under `parent_id`, or at the root when `None`.
    CreateFolder {
        parent_id: Option<String>,
        parent_name: Option<String>,
    },
    Rename {
        id: String,
        original: String,
    },
    DeleteConfirm {
        id: String,
        name: String,
    },
    /// Upload surface; `target` is the selected folder (id, name) when it was opened.
    Upload {
        target: Option<(String, String)>,
    },
    /// Blocking message, dismissed with Enter/Esc.
    Notice {
        message: String,
    },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Typing into the root-folder search box.
    Search,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// One line of the upload dialog's file list.
pub type UploadPreview = Result<FileDescriptor, String>;

/// A transient message shown in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub session: Session,
    pub orchestrator: UploadOrchestrator,
    /// Visible rows, rebuilt after every change.
    pub flat_items: Vec<FlatItem>,
    /// Highlighted row. Tracks the selection when the selected node is visible.
    pub cursor: usize,
    pub scroll_offset: usize,
    pub search_query: String,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub upload_preview: Vec<UploadPreview>,
    pub status_message: Option<StatusMessage>,
    pub should_quit: bool,
    pub theme: ThemeColors,
    pub use_icons: bool,
    /// Inner area of the tree panel from the last draw, for mouse hit-testing.
    pub tree_area: Rect,
}

impl App {
    pub fn new(session: Session, orchestrator: UploadOrchestrator, theme: ThemeColors, use_icons: bool) -> Self {
        let mut app = Self {
            session,
            orchestrator,
            flat_items: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            search_query: String::new(),
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            upload_preview: Vec::new(),
            status_message: None,
            should_quit: false,
            theme,
            use_icons,
            tree_area: Rect::default(),
        };
        app.refresh_view();
        app
    }

    // ── View ────────────────────────────────────────────────────────────

    /// Rebuild the visible rows from the current forest and search filter,
    /// and move the cursor onto the selected node if it is visible.
    pub fn refresh_view(&mut self) {
        let roots = self.session.search_folders(&self.search_query);
        self.flat_items = flatten(&roots);

        if let Some(id) = self.session.selected_id() {
            if let Some(index) = self.flat_items.iter().position(|item| item.id == id) {
                self.cursor = index;
            }
        }
        if self.cursor >= self.flat_items.len() {
            self.cursor = self.flat_items.len().saturating_sub(1);
        }

        if let Some(err) = self.session.take_save_error() {
            self.set_error_message(format!("Save failed: {err}"));
        }
    }

    /// The highlighted row, if any.
    pub fn cursor_item(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.cursor)
    }

    /// Index of the selected node among the visible rows.
    pub fn selected_row(&self) -> Option<usize> {
        let id = self.session.selected_id()?;
        self.flat_items.iter().position(|item| item.id == id)
    }

    /// Update the scroll offset to ensure the cursor row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor - visible_height + 1;
        }
    }

    /// Breadcrumb of the selected node, e.g. "1st Year / Data Structures".
    pub fn breadcrumb(&self) -> String {
        self.session
            .selected_id()
            .and_then(|id| self.session.forest().path_to(id))
            .map(|path| path.join(" / "))
            .unwrap_or_default()
    }

    // ── Navigation & selection ──────────────────────────────────────────

    /// Select the node shown on row `index` (a click).
    pub fn select_row(&mut self, index: usize) {
        if let Some(item) = self.flat_items.get(index) {
            let id = item.id.clone();
            self.cursor = index;
            self.session.select_item(&id);
        }
    }

    /// Move selection down by one row. With nothing selected, selects the
    /// highlighted row first.
    pub fn select_next(&mut self) {
        if self.flat_items.is_empty() {
            return;
        }
        let next = match self.selected_row() {
            Some(row) => (row + 1).min(self.flat_items.len() - 1),
            None => self.cursor,
        };
        self.select_row(next);
    }

    /// Move selection up by one row.
    pub fn select_previous(&mut self) {
        if self.flat_items.is_empty() {
            return;
        }
        let prev = match self.selected_row() {
            Some(row) => row.saturating_sub(1),
            None => self.cursor,
        };
        self.select_row(prev);
    }

    pub fn select_first(&mut self) {
        self.select_row(0);
    }

    pub fn select_last(&mut self) {
        if !self.flat_items.is_empty() {
            self.select_row(self.flat_items.len() - 1);
        }
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    /// Toggle the highlighted folder; on a file, just select it.
    pub fn toggle_current(&mut self) {
        let Some(item) = self.cursor_item().cloned() else {
            return;
        };
        self.session.select_item(&item.id);
        if item.kind == NodeKind::Folder {
            self.session.toggle_expand(&item.id);
            self.refresh_view();
        }
    }

    /// Expand the highlighted folder, or step into its first child when it
    /// is already expanded.
    pub fn expand_current(&mut self) {
        let Some(item) = self.cursor_item().cloned() else {
            return;
        };
        if item.kind != NodeKind::Folder {
            return;
        }
        if item.is_expanded {
            if item.child_count > 0 {
                self.select_row(self.cursor + 1);
            }
        } else {
            self.session.select_item(&item.id);
            self.session.set_expanded(&item.id, true);
            self.refresh_view();
        }
    }

    /// Collapse the highlighted folder, or jump to the parent row.
    pub fn collapse_current(&mut self) {
        let Some(item) = self.cursor_item().cloned() else {
            return;
        };
        if item.kind == NodeKind::Folder && item.is_expanded {
            self.session.select_item(&item.id);
            self.session.set_expanded(&item.id, false);
            self.refresh_view();
            return;
        }
        if item.depth == 0 {
            return;
        }
        let parent = self.flat_items[..self.cursor]
            .iter()
            .rposition(|row| row.depth + 1 == item.depth);
        if let Some(index) = parent {
            self.select_row(index);
        }
    }

    // ── Search ──────────────────────────────────────────────────────────

    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
    }

    pub fn search_input_char(&mut self, c: char) {
        self.search_query.push(c);
        self.refresh_view();
    }

    pub fn search_delete_char(&mut self) {
        self.search_query.pop();
        self.refresh_view();
    }

    /// Leave the search box, keeping the filter.
    pub fn finish_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Leave the search box and drop the filter.
    pub fn cancel_search(&mut self) {
        self.search_query.clear();
        self.mode = AppMode::Normal;
        self.refresh_view();
    }

    // ── Dialogs ─────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        self.upload_preview.clear();
        if let DialogKind::Rename { ref original, .. } = kind {
            self.dialog_state.cursor_position = original.len();
            self.dialog_state.input = original.clone();
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
        self.upload_preview.clear();
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.open_dialog(DialogKind::Notice {
            message: message.into(),
        });
    }

    /// New folder at the root level.
    pub fn open_create_root_dialog(&mut self) {
        self.open_dialog(DialogKind::CreateFolder {
            parent_id: None,
            parent_name: None,
        });
    }

    /// New folder inside the selected folder.
    pub fn open_create_child_dialog(&mut self) {
        match self.session.selected_item() {
            Some(TreeItem::Folder(folder)) => {
                let kind = DialogKind::CreateFolder {
                    parent_id: Some(folder.id.clone()),
                    parent_name: Some(folder.name.clone()),
                };
                self.open_dialog(kind);
            }
            _ => self.notice("Select a folder to create a subfolder in."),
        }
    }

    pub fn open_rename_dialog(&mut self) {
        if let Some(item) = self.session.selected_item() {
            let kind = DialogKind::Rename {
                id: item.id().to_string(),
                original: item.name().to_string(),
            };
            self.open_dialog(kind);
        } else {
            self.set_error_message("Nothing selected".into());
        }
    }

    pub fn open_delete_dialog(&mut self) {
        if let Some(item) = self.session.selected_item() {
            let kind = DialogKind::DeleteConfirm {
                id: item.id().to_string(),
                name: item.name().to_string(),
            };
            self.open_dialog(kind);
        } else {
            self.set_error_message("Nothing selected".into());
        }
    }

    /// Open the upload surface for the selected folder. With no folder
    /// selected the dialog still opens and shows a warning; submitting is
    /// then rejected.
    pub fn open_upload_dialog(&mut self) {
        let target = match self.session.selected_item() {
            Some(TreeItem::Folder(folder)) => Some((folder.id.clone(), folder.name.clone())),
            _ => None,
        };
        self.open_dialog(DialogKind::Upload { target });
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
        self.on_dialog_input_changed();
    }

    /// Insert a string at the current cursor position.
    pub fn dialog_input_str(&mut self, s: &str) {
        self.dialog_state
            .input
            .insert_str(self.dialog_state.cursor_position, s);
        self.dialog_state.cursor_position += s.len();
        self.on_dialog_input_changed();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let byte_pos = self.dialog_state.cursor_position;
        if let Some(prev_char) = self.dialog_state.input[..byte_pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev_char.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
            self.on_dialog_input_changed();
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev_char) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev_char.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next_char) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next_char.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    fn on_dialog_input_changed(&mut self) {
        if matches!(self.mode, AppMode::Dialog(DialogKind::Upload { .. })) {
            let paths = parse_path_list(&self.dialog_state.input);
            self.upload_preview = paths
                .iter()
                .map(|path| {
                    FileDescriptor::from_path(path).map_err(|e| format!("{}: {}", path.display(), e))
                })
                .collect();
        }
    }

    /// Text pasted into the terminal. Files dropped on the window arrive
    /// this way, so a paste outside a dialog opens the upload surface.
    pub fn handle_paste(&mut self, text: &str) {
        match self.mode {
            AppMode::Dialog(DialogKind::Upload { .. }) => {
                self.dialog_cursor_end();
                if !self.dialog_state.input.is_empty() && !self.dialog_state.input.ends_with(' ') {
                    self.dialog_input_char(' ');
                }
                self.dialog_input_str(text.trim());
            }
            AppMode::Dialog(DialogKind::CreateFolder { .. } | DialogKind::Rename { .. }) => {
                let single_line: String = text.lines().collect::<Vec<_>>().join(" ");
                self.dialog_input_str(&single_line);
            }
            AppMode::Search => {
                self.search_query.push_str(text.trim());
                self.refresh_view();
            }
            AppMode::Normal => {
                self.open_upload_dialog();
                self.dialog_input_str(text.trim());
            }
            AppMode::Dialog(_) => {}
        }
    }

    /// Enter pressed in a dialog.
    pub fn submit_dialog(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind.clone(),
            _ => return,
        };
        match kind {
            DialogKind::CreateFolder { parent_id, .. } => {
                let name = self.dialog_state.input.clone();
                match self.session.create_folder(parent_id.as_deref(), &name) {
                    Ok(Some(_)) => {
                        self.close_dialog();
                        self.set_status_message(format!("Created folder \"{}\"", name.trim()));
                    }
                    Ok(None) => {
                        self.close_dialog();
                        self.set_error_message("Parent folder no longer exists".into());
                    }
                    // Blank input: keep the dialog open, nothing happens.
                    Err(ActionError::EmptyName) => {}
                    Err(e) => self.set_error_message(e.to_string()),
                }
                self.refresh_view();
            }
            DialogKind::Rename { id, .. } => {
                let name = self.dialog_state.input.clone();
                if self.session.rename_item(&id, &name).is_ok() {
                    self.close_dialog();
                    self.set_status_message(format!("Renamed to \"{}\"", name.trim()));
                    self.refresh_view();
                }
            }
            DialogKind::DeleteConfirm { .. } => self.confirm_delete(),
            DialogKind::Upload { .. } => self.submit_upload(tx),
            DialogKind::Notice { .. } => self.close_dialog(),
        }
    }

    /// Accept the delete confirmation.
    pub fn confirm_delete(&mut self) {
        if let AppMode::Dialog(DialogKind::DeleteConfirm { id, name }) = &self.mode {
            let (id, name) = (id.clone(), name.clone());
            self.session.delete_item(&id);
            self.close_dialog();
            self.set_status_message(format!("Deleted \"{name}\""));
            self.refresh_view();
        }
    }

    fn submit_upload(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        let paths = parse_path_list(&self.dialog_state.input);
        let (descriptors, errors) = describe_paths(&paths);

        match self.session.begin_upload(descriptors) {
            Ok(batch) => {
                let count = batch.descriptors.len();
                self.orchestrator.spawn(batch, tx.clone());
                if errors.is_empty() {
                    self.set_status_message(format!("Uploading {count} file(s)..."));
                } else {
                    self.set_error_message(format!(
                        "Uploading {count} file(s); skipped {} unreadable path(s)",
                        errors.len()
                    ));
                }
            }
            Err(ActionError::InvalidUploadTarget) => {
                self.notice(ActionError::InvalidUploadTarget.to_string());
            }
            Err(ActionError::NoFiles) if !errors.is_empty() => {
                self.set_error_message(errors.join("; "));
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    /// Apply a finished upload to the forest as it is now.
    pub fn handle_upload_complete(&mut self, batch: UploadBatch) {
        let target_name = self
            .session
            .forest()
            .find(&batch.target_id)
            .map(|item| item.name().to_string());
        let inserted = self.session.complete_upload(batch);

        if matches!(self.mode, AppMode::Dialog(DialogKind::Upload { .. })) {
            self.close_dialog();
        }
        match target_name {
            Some(name) if inserted > 0 => {
                self.set_status_message(format!("Uploaded {inserted} file(s) to \"{name}\""))
            }
            _ => self.set_error_message("Upload target no longer exists".into()),
        }
        self.refresh_view();
    }

    // ── Status ──────────────────────────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, msg: String) {
        tracing::debug!(message = %msg, "status error");
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some(status) = &self.status_message {
            if status.created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;
    use crate::store::Persistence;
    use crate::theme::dark_theme;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup_app() -> App {
        let session = Session::open(Persistence::in_memory(), Box::new(SequentialIds::new("n")));
        App::new(
            session,
            UploadOrchestrator::new(Duration::from_millis(10)),
            dark_theme(),
            false,
        )
    }

    fn names(app: &App) -> Vec<&str> {
        app.flat_items.iter().map(|i| i.name.as_str()).collect()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.dialog_input_char(c);
        }
    }

    #[test]
    fn starts_with_collapsed_years_and_no_selection() {
        let app = setup_app();
        assert_eq!(names(&app), vec!["1st Year", "2nd Year", "3rd Year", "4th Year"]);
        assert!(app.session.selected_id().is_none());
    }

    #[test]
    fn first_move_selects_highlighted_row() {
        let mut app = setup_app();
        app.select_next();
        assert_eq!(app.session.selected_id(), Some("year-1"));
        app.select_next();
        assert_eq!(app.session.selected_id(), Some("year-2"));
        app.select_previous();
        assert_eq!(app.session.selected_id(), Some("year-1"));
    }

    #[test]
    fn select_clamps_at_edges() {
        let mut app = setup_app();
        app.select_last();
        app.select_next();
        assert_eq!(app.session.selected_id(), Some("year-4"));
        app.select_first();
        app.select_previous();
        assert_eq!(app.session.selected_id(), Some("year-1"));
    }

    #[test]
    fn toggle_expands_and_collapses() {
        let mut app = setup_app();
        app.toggle_current();
        assert_eq!(app.flat_items.len(), 4 + 3);
        assert_eq!(app.flat_items[1].name, "Programming Fundamentals");
        app.toggle_current();
        assert_eq!(app.flat_items.len(), 4);
    }

    #[test]
    fn expand_then_step_in_then_collapse_to_parent() {
        let mut app = setup_app();
        app.select_first();
        app.expand_current();
        assert!(app.flat_items[0].is_expanded);
        app.expand_current();
        assert_eq!(app.session.selected_id(), Some("year-1-subject-0"));
        app.collapse_current();
        assert_eq!(app.session.selected_id(), Some("year-1"));
        app.collapse_current();
        assert!(!app.flat_items[0].is_expanded);
    }

    #[test]
    fn search_filters_roots_only() {
        let mut app = setup_app();
        app.start_search();
        for c in "engineer".chars() {
            app.search_input_char(c);
        }
        assert!(app.flat_items.is_empty());
        app.cancel_search();
        assert_eq!(app.flat_items.len(), 4);

        app.start_search();
        for c in "3RD".chars() {
            app.search_input_char(c);
        }
        app.finish_search();
        assert_eq!(names(&app), vec!["3rd Year"]);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn create_folder_through_dialog() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.open_create_root_dialog();
        type_text(&mut app, "Electives");
        app.submit_dialog(&tx);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(names(&app).last(), Some(&"Electives"));
    }

    #[test]
    fn blank_name_keeps_dialog_open() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.open_create_root_dialog();
        type_text(&mut app, "   ");
        app.submit_dialog(&tx);
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::CreateFolder { .. })));
        assert_eq!(app.session.forest().roots().len(), 4);
    }

    #[test]
    fn subfolder_dialog_requires_folder_selection() {
        let mut app = setup_app();
        app.open_create_child_dialog();
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::Notice { .. })));

        app.close_dialog();
        app.select_first();
        app.open_create_child_dialog();
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::CreateFolder {
                parent_id: Some("year-1".into()),
                parent_name: Some("1st Year".into()),
            })
        );
    }

    #[test]
    fn rename_prefills_input() {
        let mut app = setup_app();
        app.select_first();
        app.open_rename_dialog();
        assert_eq!(app.dialog_state.input, "1st Year");
        assert_eq!(app.dialog_state.cursor_position, 8);
    }

    #[test]
    fn rename_through_dialog() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.select_first();
        app.open_rename_dialog();
        for _ in 0..4 {
            app.dialog_delete_char();
        }
        type_text(&mut app, "Semester");
        app.submit_dialog(&tx);
        assert_eq!(app.flat_items[0].name, "1st Semester");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = setup_app();
        app.select_first();
        app.open_delete_dialog();
        // Declining leaves everything in place.
        app.close_dialog();
        assert_eq!(app.flat_items.len(), 4);
        assert_eq!(app.session.selected_id(), Some("year-1"));

        app.open_delete_dialog();
        app.confirm_delete();
        assert_eq!(names(&app), vec!["2nd Year", "3rd Year", "4th Year"]);
        assert!(app.session.selected_id().is_none());
    }

    #[test]
    fn dialog_cursor_editing() {
        let mut app = setup_app();
        app.open_create_root_dialog();
        type_text(&mut app, "ab");
        app.dialog_move_cursor_left();
        app.dialog_input_char('é');
        assert_eq!(app.dialog_state.input, "aéb");
        app.dialog_cursor_home();
        app.dialog_move_cursor_left();
        assert_eq!(app.dialog_state.cursor_position, 0);
        app.dialog_cursor_end();
        app.dialog_move_cursor_right();
        assert_eq!(app.dialog_state.cursor_position, app.dialog_state.input.len());
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "aé");
    }

    #[test]
    fn upload_without_folder_shows_notice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"x").unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.open_upload_dialog();
        app.dialog_input_str(&path.display().to_string());
        app.submit_dialog(&tx);
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::Notice {
                message: "Please select a folder to upload files to.".into()
            })
        );
        assert!(!app.session.is_uploading());
    }

    #[test]
    fn paste_in_normal_mode_opens_upload_dialog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let mut app = setup_app();
        app.select_first();
        app.handle_paste(&format!("'{}'\n", path.display()));
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::Upload {
                target: Some(("year-1".into(), "1st Year".into()))
            })
        );
        assert_eq!(app.upload_preview.len(), 1);
        assert_eq!(app.upload_preview[0].as_ref().unwrap().size, 2048);
    }

    #[test]
    fn paste_into_upload_dialog_appends_at_end() {
        let mut app = setup_app();
        app.select_first();
        app.open_upload_dialog();
        app.dialog_input_str("/tmp/a.pdf ");
        for _ in 0..3 {
            app.dialog_move_cursor_left();
        }
        app.handle_paste("/tmp/b.pdf\n");
        assert_eq!(app.dialog_state.input, "/tmp/a.pdf /tmp/b.pdf");
        assert_eq!(app.dialog_state.cursor_position, app.dialog_state.input.len());

        app.dialog_cursor_home();
        app.handle_paste("/tmp/c.pdf");
        assert_eq!(app.dialog_state.input, "/tmp/a.pdf /tmp/b.pdf /tmp/c.pdf");
    }

    #[tokio::test]
    async fn upload_round_trip_through_event_channel() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("syllabus.pdf");
        let b = dir.path().join("notes.pdf");
        std::fs::write(&a, vec![0u8; 2048]).unwrap();
        std::fs::write(&b, vec![0u8; 4096]).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.select_first();
        app.open_upload_dialog();
        app.dialog_input_str(&format!("{} {}", a.display(), b.display()));
        app.submit_dialog(&tx);
        assert!(app.session.is_uploading());
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::Upload { .. })));

        match rx.recv().await {
            Some(Event::UploadComplete(batch)) => app.handle_upload_complete(batch),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.session.is_uploading());

        let year = app.session.forest().find("year-1").unwrap().as_folder().unwrap().clone();
        let uploaded: Vec<(&str, u64)> = year.children[3..]
            .iter()
            .map(|c| (c.name(), c.as_file().unwrap().size))
            .collect();
        assert_eq!(uploaded, vec![("syllabus.pdf", 2048), ("notes.pdf", 4096)]);
    }

    #[tokio::test]
    async fn closing_upload_dialog_does_not_cancel() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"hello").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.select_first();
        app.open_upload_dialog();
        app.dialog_input_str(&a.display().to_string());
        app.submit_dialog(&tx);
        app.close_dialog();

        if let Some(Event::UploadComplete(batch)) = rx.recv().await {
            app.handle_upload_complete(batch);
        }
        assert!(app.session.forest().find("year-1").unwrap().as_folder().unwrap().children.len() == 4);
    }

    #[tokio::test]
    async fn deleting_target_during_upload_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"hello").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = setup_app();
        app.select_first();
        app.open_upload_dialog();
        app.dialog_input_str(&a.display().to_string());
        app.submit_dialog(&tx);
        app.close_dialog();

        app.open_delete_dialog();
        app.confirm_delete();
        let before = app.session.forest().clone();

        if let Some(Event::UploadComplete(batch)) = rx.recv().await {
            app.handle_upload_complete(batch);
        }
        assert_eq!(app.session.forest(), &before);
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[test]
    fn breadcrumb_follows_selection() {
        let mut app = setup_app();
        assert_eq!(app.breadcrumb(), "");
        app.select_first();
        app.expand_current();
        app.expand_current();
        assert_eq!(app.breadcrumb(), "1st Year / Programming Fundamentals");
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let mut app = setup_app();
        app.set_status_message("fresh".into());
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        app.status_message.as_mut().unwrap().created = Instant::now() - Duration::from_secs(5);
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = setup_app();
        app.quit();
        assert!(app.should_quit);
    }
}
