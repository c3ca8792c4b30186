use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::{App, AppMode, DialogKind};
use crate::event::Event;

/// Handle a key event according to the current mode.
pub fn handle_key_event(app: &mut App, key: KeyEvent, tx: &mpsc::UnboundedSender<Event>) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        AppMode::Normal => handle_normal_mode(app, key),
        AppMode::Search => handle_search_mode(app, key),
        AppMode::Dialog(DialogKind::DeleteConfirm { .. }) => handle_confirm_mode(app, key),
        AppMode::Dialog(DialogKind::Notice { .. }) => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        AppMode::Dialog(_) => handle_input_mode(app, key, tx),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_current(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_current(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_current(),
        KeyCode::Char('n') => app.open_create_root_dialog(),
        KeyCode::Char('N') => app.open_create_child_dialog(),
        KeyCode::Char('r') | KeyCode::F(2) => app.open_rename_dialog(),
        KeyCode::Char('d') | KeyCode::Delete => app.open_delete_dialog(),
        KeyCode::Char('u') => app.open_upload_dialog(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Esc => {
            if app.search_query.is_empty() {
                app.clear_selection();
            } else {
                app.cancel_search();
            }
        }
        _ => {}
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter | KeyCode::Down => app.finish_search(),
        KeyCode::Backspace => app.search_delete_char(),
        KeyCode::Char(c) => app.search_input_char(c),
        _ => {}
    }
}

fn handle_confirm_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

fn handle_input_mode(app: &mut App, key: KeyEvent, tx: &mpsc::UnboundedSender<Event>) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => app.submit_dialog(tx),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

/// Handle a mouse event: left click selects a tree row, the wheel moves
/// the selection.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode != AppMode::Normal {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let area = app.tree_area;
            let inside = mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height;
            if !inside {
                return;
            }
            let index = app.scroll_offset + (mouse.row - area.y) as usize;
            if index < app.flat_items.len() {
                if app.selected_row() == Some(index) {
                    app.toggle_current();
                } else {
                    app.select_row(index);
                }
            }
        }
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_previous(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;
    use crate::session::Session;
    use crate::store::Persistence;
    use crate::theme::dark_theme;
    use crate::upload::UploadOrchestrator;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    fn setup_app() -> App {
        let session = Session::open(Persistence::in_memory(), Box::new(SequentialIds::new("n")));
        App::new(session, UploadOrchestrator::default(), dark_theme(), false)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press(app: &mut App, codes: &[KeyCode]) {
        let (tx, _rx) = mpsc::unbounded_channel();
        for code in codes {
            handle_key_event(app, key(*code), &tx);
        }
    }

    fn click(app: &mut App, column: u16, row: u16) {
        handle_mouse_event(
            app,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            },
        );
    }

    #[test]
    fn quit_keys() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('q')]);
        assert!(app.should_quit);

        let mut app = setup_app();
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        app.open_create_root_dialog();
        handle_key_event(&mut app, ctrl_c, &tx);
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys_move_selection() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('j'), KeyCode::Char('j'), KeyCode::Down]);
        assert_eq!(app.session.selected_id(), Some("year-3"));
        press(&mut app, &[KeyCode::Char('k')]);
        assert_eq!(app.session.selected_id(), Some("year-2"));
        press(&mut app, &[KeyCode::Char('G')]);
        assert_eq!(app.session.selected_id(), Some("year-4"));
        press(&mut app, &[KeyCode::Esc]);
        assert!(app.session.selected_id().is_none());
    }

    #[test]
    fn q_in_dialog_is_text() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('q')]);
        assert!(!app.should_quit);
        assert_eq!(app.dialog_state.input, "q");
    }

    #[test]
    fn create_folder_via_keys() {
        let mut app = setup_app();
        let mut codes = vec![KeyCode::Char('n')];
        codes.extend("Capstone".chars().map(KeyCode::Char));
        codes.push(KeyCode::Enter);
        press(&mut app, &codes);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.flat_items.last().unwrap().name, "Capstone");
    }

    #[test]
    fn escape_cancels_dialog() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('x'), KeyCode::Esc]);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.flat_items.len(), 4);
    }

    #[test]
    fn delete_confirmation_keys() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('j'), KeyCode::Char('d'), KeyCode::Char('n')]);
        assert_eq!(app.flat_items.len(), 4);
        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert_eq!(app.flat_items.len(), 3);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn search_mode_keys() {
        let mut app = setup_app();
        press(
            &mut app,
            &[KeyCode::Char('/'), KeyCode::Char('2'), KeyCode::Char('n'), KeyCode::Enter],
        );
        assert_eq!(app.search_query, "2n");
        assert_eq!(app.flat_items.len(), 1);
        assert_eq!(app.mode, AppMode::Normal);
        press(&mut app, &[KeyCode::Esc]);
        assert!(app.search_query.is_empty());
        assert_eq!(app.flat_items.len(), 4);
    }

    #[test]
    fn notice_dismissed_with_enter() {
        let mut app = setup_app();
        press(&mut app, &[KeyCode::Char('N')]);
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::Notice { .. })));
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn click_selects_then_toggles() {
        let mut app = setup_app();
        app.tree_area = Rect::new(1, 2, 40, 10);
        click(&mut app, 5, 3);
        assert_eq!(app.session.selected_id(), Some("year-2"));
        click(&mut app, 5, 3);
        assert!(app.flat_items[1].is_expanded);
        // Outside the panel.
        click(&mut app, 60, 3);
        assert_eq!(app.session.selected_id(), Some("year-2"));
        // Below the last row.
        click(&mut app, 5, 11);
        assert_eq!(app.session.selected_id(), Some("year-2"));
    }
}
