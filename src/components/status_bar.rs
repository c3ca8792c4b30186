use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " n:new  N:sub  r:ren  d:del  u:upload  /:search  q:quit ";
const UPLOADING: &str = "⏳ Uploading";

/// Keep at most `width` characters of `s`, dropping from the front and
/// marking the cut with `...`.
fn truncate_front(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len <= width {
        return s.to_string();
    }
    if width <= 3 {
        return s.chars().skip(len - width).collect();
    }
    let tail: String = s.chars().skip(len - (width - 3)).collect();
    format!("...{tail}")
}

fn truncate_back(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Status bar: breadcrumb of the selection, its summary, upload state and
/// key hints. A transient status message replaces the whole bar.
pub struct StatusBarWidget<'a> {
    breadcrumb: &'a str,
    item_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    uploading: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(breadcrumb: &'a str, item_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            breadcrumb,
            item_info,
            theme,
            status_message: None,
            is_error: false,
            uploading: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn uploading(mut self, uploading: bool) -> Self {
        self.uploading = uploading;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", truncate_back(msg, width), width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let hints_len = KEY_HINTS.chars().count();
        let upload_len = if self.uploading {
            UPLOADING.chars().count() + 1
        } else {
            0
        };
        let remaining = width.saturating_sub(hints_len + upload_len);

        let info_display = truncate_back(self.item_info, remaining);
        let info_len = info_display.chars().count();
        let path_budget = remaining.saturating_sub(info_len + 1);
        let path_display = truncate_front(self.breadcrumb, path_budget);
        let gap = remaining.saturating_sub(path_display.chars().count() + info_len);

        let mut spans = vec![
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, Style::default().fg(self.theme.info_fg)),
        ];

        if self.uploading {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                UPLOADING,
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
