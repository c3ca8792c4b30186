use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::details::{format_kb, DetailsWidget};
use crate::components::dialog::DialogWidget;
use crate::components::search_bar::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::tree::TreeItem;

const EMPTY_TREE: &str = "No folders found. Press n to create your first folder.";

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        SearchBarWidget::new(&app.search_query, app.mode == AppMode::Search, &app.theme),
        rows[0],
    );

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(67), Constraint::Percentage(33)])
        .split(rows[1]);

    render_tree(app, frame, panels[0]);

    let details_block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    frame.render_widget(
        DetailsWidget::new(app.session.selected_item(), &app.theme).block(details_block),
        panels[1],
    );

    let breadcrumb = app.breadcrumb();
    let info = item_summary(app.session.selected_item());
    let mut status = StatusBarWidget::new(&breadcrumb, &info, &app.theme)
        .uploading(app.session.is_uploading());
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, rows[2]);

    if matches!(app.mode, AppMode::Dialog(_)) {
        let dialog = DialogWidget::new(&app.mode, &app.dialog_state, &app.theme)
            .upload(app.session.is_uploading(), &app.upload_preview);
        frame.render_widget(dialog, area);
    }
}

fn render_tree(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Course Materials ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));

    let inner = block.inner(area);
    app.tree_area = inner;

    if app.flat_items.is_empty() {
        let message = if app.search_query.is_empty() {
            EMPTY_TREE.to_string()
        } else {
            format!("No folders match \"{}\".", app.search_query)
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default()
                .fg(app.theme.dim_fg)
                .add_modifier(Modifier::ITALIC),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Keep the highlighted row visible.
    app.update_scroll(inner.height as usize);

    let tree = TreeWidget::new(&app.flat_items, &app.theme, app.use_icons)
        .selected(app.selected_row())
        .cursor(app.cursor, app.scroll_offset)
        .block(block);
    frame.render_widget(tree, area);
}

/// One-line summary of the selected node for the status bar.
fn item_summary(item: Option<&TreeItem>) -> String {
    match item {
        Some(TreeItem::Folder(folder)) => format!("Folder | {} items", folder.children.len()),
        Some(TreeItem::File(file)) => format!("{} | {}", format_kb(file.size), file.mime_type),
        None => String::new(),
    }
}
