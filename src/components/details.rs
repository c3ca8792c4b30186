use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::TreeItem;

pub const EMPTY_PLACEHOLDER: &str = "Select an item to view details";

/// Size as kilobytes with one decimal, e.g. `2.0 KB`.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Details panel for the selected node.
pub struct DetailsWidget<'a> {
    item: Option<&'a TreeItem>,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> DetailsWidget<'a> {
    pub fn new(item: Option<&'a TreeItem>, theme: &'a ThemeColors) -> Self {
        Self {
            item,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn rows(item: &TreeItem) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Name", item.name().to_string()),
            ("Type", item.kind_label().to_string()),
        ];
        match item {
            TreeItem::File(file) => {
                rows.push(("Size", format_kb(file.size)));
                rows.push(("MIME Type", file.mime_type.clone()));
                rows.push((
                    "Upload Date",
                    file.upload_date
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                ));
            }
            TreeItem::Folder(folder) => {
                rows.push(("Items", folder.children.len().to_string()));
            }
        }
        rows
    }
}

impl<'a> Widget for DetailsWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let Some(item) = self.item else {
            let line = Line::from(Span::styled(
                EMPTY_PLACEHOLDER,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        };

        let label_style = Style::default().fg(self.theme.details_label_fg);
        let value_style = Style::default()
            .fg(self.theme.details_value_fg)
            .add_modifier(Modifier::BOLD);

        // Label on one line, value below it, blank line between fields.
        let mut y = inner.y;
        let bottom = inner.y + inner.height;
        for (label, value) in Self::rows(item) {
            if y >= bottom {
                break;
            }
            buf.set_line(inner.x, y, &Line::from(Span::styled(label, label_style)), inner.width);
            y += 1;
            if y >= bottom {
                break;
            }
            buf.set_line(inner.x, y, &Line::from(Span::styled(value, value_style)), inner.width);
            y += 2;
        }
    }
}
