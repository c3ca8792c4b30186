use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState, UploadPreview};
use crate::theme::ThemeColors;
use crate::upload::format_file_size;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
    uploading: bool,
    upload_preview: &'a [UploadPreview],
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
            uploading: false,
            upload_preview: &[],
        }
    }

    /// Upload progress and the files resolved from the current input.
    pub fn upload(mut self, uploading: bool, preview: &'a [UploadPreview]) -> Self {
        self.uploading = uploading;
        self.upload_preview = preview;
        self
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }

    /// Clear `rect`, draw a bordered frame and return its inner area.
    fn frame(&self, title: &str, border: ratatui::style::Color, rect: Rect, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let style = Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM);
            let line = Line::from(Span::styled(text.to_string(), style));
            buf.set_line(inner.x, inner.y + inner.height - 1, &line, inner.width);
        }
    }

    fn render_input_dialog(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let width = 50.min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 5, area);
        let inner = self.frame(title, self.theme.dialog_border_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let line = input_line(self.dialog_state, inner.width as usize, self.theme);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);
        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_confirm_dialog(&self, name: &str, area: Rect, buf: &mut Buffer) {
        let width = padded_width(name, 16)
            .max(44)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 7, area);
        let inner = self.frame("Delete Confirmation", self.theme.error_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let header = Line::from(vec![
            Span::styled(
                "Delete ",
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("\"{name}\"?"),
                Style::default()
                    .fg(self.theme.details_value_fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        buf.set_line(inner.x, inner.y, &header, inner.width);
        if inner.height > 2 {
            let note = Line::from(Span::styled(
                "Everything inside it is deleted too.",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, inner.y + 2, &note, inner.width);
        }
        self.hint("[y] Yes  [n/Esc] Cancel", inner, buf);
    }

    fn render_notice_dialog(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = padded_width(message, 6)
            .max(30)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 5, area);
        let inner = self.frame("Notice", self.theme.warning_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let line = Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(self.theme.warning_fg),
        ));
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);
        self.hint("[Enter/Esc] Dismiss", inner, buf);
    }

    fn render_upload_dialog(&self, target: Option<&str>, area: Rect, buf: &mut Buffer) {
        let width = 64.min(area.width.saturating_sub(4));
        let list_rows = self.upload_preview.len().clamp(1, 6) as u16;
        let height = (list_rows + 8).min(area.height.saturating_sub(2));
        let rect = Self::centered_rect(width, height, area);
        let inner = self.frame("Upload Files", self.theme.dialog_border_fg, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let bottom = inner.y + inner.height;

        let target_line = match target {
            Some(name) => Line::from(vec![
                Span::styled("To: ", Style::default().fg(self.theme.details_label_fg)),
                Span::styled(
                    name.to_string(),
                    Style::default()
                        .fg(self.theme.tree_dir_fg)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(Span::styled(
                "Please select a folder to upload files to.",
                Style::default().fg(self.theme.warning_fg),
            )),
        };
        buf.set_line(inner.x, inner.y, &target_line, inner.width);

        let mut y = inner.y + 2;
        if y < bottom {
            let prompt = if self.dialog_state.input.is_empty() {
                Line::from(Span::styled(
                    "Paste or drop files here, or type paths",
                    Style::default().fg(self.theme.dim_fg),
                ))
            } else {
                input_line(self.dialog_state, inner.width as usize, self.theme)
            };
            buf.set_line(inner.x, y, &prompt, inner.width);
            y += 2;
        }

        let shown = list_rows as usize;
        for entry in self.upload_preview.iter().take(shown) {
            if y + 1 >= bottom {
                break;
            }
            let line = match entry {
                Ok(file) => Line::from(vec![
                    Span::styled(
                        format!("{} ", file.name),
                        Style::default().fg(self.theme.tree_file_fg),
                    ),
                    Span::styled(
                        format_file_size(file.size),
                        Style::default().fg(self.theme.dim_fg),
                    ),
                ]),
                Err(message) => Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(self.theme.error_fg),
                )),
            };
            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }
        if self.upload_preview.len() > shown && y + 1 < bottom {
            let more = Line::from(Span::styled(
                format!("... and {} more", self.upload_preview.len() - shown),
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, y, &more, inner.width);
        }

        if self.uploading {
            let line = Line::from(Span::styled(
                "Uploading...",
                Style::default()
                    .fg(self.theme.info_fg)
                    .add_modifier(Modifier::BOLD),
            ));
            if inner.height > 2 {
                buf.set_line(inner.x, bottom - 2, &line, inner.width);
            }
            self.hint("[Esc] Close (upload continues)", inner, buf);
        } else {
            self.hint("[Enter] Upload  [Esc] Cancel", inner, buf);
        }
    }
}

/// Input text with a block cursor, scrolled so the cursor stays visible.
fn input_line<'s>(state: &'s DialogState, max_width: usize, theme: &ThemeColors) -> Line<'s> {
    let input = state.input.as_str();
    let cursor_pos = state.cursor_position.min(input.len());

    let before = &input[..cursor_pos];
    let (cursor_char, after) = match input[cursor_pos..].chars().next() {
        Some(c) => (
            &input[cursor_pos..cursor_pos + c.len_utf8()],
            &input[cursor_pos + c.len_utf8()..],
        ),
        None => (" ", ""),
    };

    // Keep the tail of `before` when the line overflows.
    let budget = max_width.saturating_sub(2);
    let before_chars = before.chars().count();
    let before_display = if before_chars > budget {
        let skip = before_chars - budget;
        let start = before.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(0);
        &before[start..]
    } else {
        before
    };

    let input_style = Style::default().fg(theme.details_value_fg);
    let cursor_style = Style::default()
        .bg(theme.details_value_fg)
        .fg(theme.status_bg)
        .add_modifier(Modifier::BOLD);

    Line::from(vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ])
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::CreateFolder {
                parent_name: Some(parent),
                ..
            } => {
                self.render_input_dialog(&format!("New Folder in {parent}"), area, buf);
            }
            DialogKind::CreateFolder { .. } => {
                self.render_input_dialog("Create New Folder", area, buf);
            }
            DialogKind::Rename { .. } => {
                self.render_input_dialog("Rename", area, buf);
            }
            DialogKind::DeleteConfirm { name, .. } => {
                self.render_confirm_dialog(name, area, buf);
            }
            DialogKind::Upload { target } => {
                let name = target.as_ref().map(|(_, name)| name.as_str());
                self.render_upload_dialog(name, area, buf);
            }
            DialogKind::Notice { message } => {
                self.render_notice_dialog(message, area, buf);
            }
        }
    }
}

/// Display width of `text` plus `pad` columns, clamped to `u16`.
fn padded_width(text: &str, pad: u16) -> u16 {
    u16::try_from(text.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(pad)
}
