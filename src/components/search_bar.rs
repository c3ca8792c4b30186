use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

pub const TITLE: &str = "Software Engineering LMS";
const SEARCH_WIDTH: u16 = 32;

/// Header line: application title on the left, folder search box on the right.
pub struct SearchBarWidget<'a> {
    query: &'a str,
    active: bool,
    theme: &'a ThemeColors,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(query: &'a str, active: bool, theme: &'a ThemeColors) -> Self {
        Self {
            query,
            active,
            theme,
        }
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let title = Line::from(Span::styled(
            format!(" {TITLE}"),
            Style::default()
                .fg(self.theme.header_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(area.x, area.y, &title, area.width);

        let box_width = SEARCH_WIDTH.min(area.width);
        let x = area.x + area.width - box_width;

        let label_style = if self.active {
            Style::default()
                .fg(self.theme.info_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.dim_fg)
        };
        let mut spans = vec![Span::styled("/ ", label_style)];
        if self.query.is_empty() && !self.active {
            spans.push(Span::styled(
                "Search folders...",
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ));
        } else {
            // Show the end of long queries.
            let room = box_width.saturating_sub(4) as usize;
            let count = self.query.chars().count();
            let shown: String = self.query.chars().skip(count.saturating_sub(room)).collect();
            spans.push(Span::styled(shown, Style::default().fg(self.theme.tree_fg)));
            if self.active {
                spans.push(Span::styled(
                    " ",
                    Style::default().bg(self.theme.tree_fg),
                ));
            }
        }
        buf.set_line(x, area.y, &Line::from(spans), box_width);
    }
}
