use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::view::{FlatItem, NodeKind};

/// Renders the visible rows of the course-material tree with box-drawing guides.
pub struct TreeWidget<'a> {
    items: &'a [FlatItem],
    /// Row of the selected node, if it is visible.
    selected: Option<usize>,
    /// Highlighted row when nothing is selected.
    cursor: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(items: &'a [FlatItem], theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            items,
            selected: None,
            cursor: 0,
            scroll_offset: 0,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn cursor(mut self, cursor: usize, scroll_offset: usize) -> Self {
        self.cursor = cursor;
        self.scroll_offset = scroll_offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Guide prefix for a row, one segment per ancestor level plus the
    /// row's own connector. Roots have no prefix.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 1..item.depth {
            // The nearest row above at depth d is this row's ancestor.
            let ancestor_is_last = items[..item_index]
                .iter()
                .rev()
                .take_while(|row| row.depth >= d)
                .find(|row| row.depth == d)
                .map(|row| row.is_last_sibling)
                .unwrap_or(false);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (item.kind, self.use_icons) {
            (NodeKind::Folder, true) if item.is_expanded => "▾ 📂 ",
            (NodeKind::Folder, true) => "▸ 📁 ",
            (NodeKind::File, true) => Self::file_icon_by_ext(&item.name),
            (NodeKind::Folder, false) if item.is_expanded => "[-] ",
            (NodeKind::Folder, false) => "[+] ",
            (NodeKind::File, false) => "    ",
        }
    }

    fn file_icon_by_ext(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "pdf" | "doc" | "docx" | "txt" | "md" => "📄 ",
            "ppt" | "pptx" | "key" => "📊 ",
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => "🖼 ",
            "mp4" | "mkv" | "mov" | "webm" | "mp3" | "wav" => "🎞 ",
            "zip" | "tar" | "gz" | "7z" | "rar" => "📦 ",
            _ => "📎 ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.items.is_empty() || visible_height == 0 {
            return;
        }

        let visible = self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, item)) in visible.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(item, self.items, idx);
            let indicator = self.item_indicator(item);

            let style = if self.selected == Some(idx) {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if self.selected.is_none() && idx == self.cursor {
                Style::default()
                    .fg(self.theme.tree_fg)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                match item.kind {
                    NodeKind::Folder => Style::default()
                        .fg(self.theme.tree_dir_fg)
                        .add_modifier(Modifier::BOLD),
                    NodeKind::File => Style::default().fg(self.theme.tree_file_fg),
                }
            };

            let line = Line::from(vec![
                Span::styled(prefix, Style::default().fg(self.theme.tree_guide_fg)),
                Span::styled(format!("{indicator}{}", item.name), style),
            ]);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;

    fn row(name: &str, kind: NodeKind, depth: usize, last: bool, expanded: bool) -> FlatItem {
        FlatItem {
            id: name.to_lowercase(),
            name: name.to_string(),
            kind,
            depth,
            is_expanded: expanded,
            is_last_sibling: last,
            child_count: 0,
            size: 0,
        }
    }

    fn sample() -> Vec<FlatItem> {
        vec![
            row("Year", NodeKind::Folder, 0, false, true),
            row("Algorithms", NodeKind::Folder, 1, false, true),
            row("notes.pdf", NodeKind::File, 2, true, false),
            row("Networks", NodeKind::Folder, 1, true, true),
            row("slides.pptx", NodeKind::File, 2, true, false),
            row("Other", NodeKind::Folder, 0, true, false),
        ]
    }

    fn render_lines(widget: TreeWidget, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn prefixes_follow_sibling_position() {
        let items = sample();
        assert_eq!(TreeWidget::build_prefix(&items[0], &items, 0), "");
        assert_eq!(TreeWidget::build_prefix(&items[1], &items, 1), "├──");
        assert_eq!(TreeWidget::build_prefix(&items[2], &items, 2), "│  └──");
        assert_eq!(TreeWidget::build_prefix(&items[3], &items, 3), "└──");
        assert_eq!(TreeWidget::build_prefix(&items[4], &items, 4), "   └──");
    }

    #[test]
    fn renders_ascii_indicators() {
        let items = sample();
        let theme = dark_theme();
        let lines = render_lines(TreeWidget::new(&items, &theme, false), 40, 6);
        assert_eq!(lines[0], "[-] Year");
        assert_eq!(lines[2], "│  └──    notes.pdf");
        assert_eq!(lines[5], "[+] Other");
    }

    #[test]
    fn scroll_offset_skips_rows() {
        let items = sample();
        let theme = dark_theme();
        let lines = render_lines(TreeWidget::new(&items, &theme, false).cursor(4, 4), 40, 2);
        assert!(lines[0].ends_with("slides.pptx"));
        assert_eq!(lines[1], "[+] Other");
    }

    #[test]
    fn selected_row_is_highlighted() {
        let items = sample();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&items, &theme, false)
            .selected(Some(1))
            .render(area, &mut buf);
        // Past the guide prefix, on the label.
        assert_eq!(buf.cell((4, 1)).unwrap().bg, theme.tree_selected_bg);
        assert_ne!(buf.cell((4, 0)).unwrap().bg, theme.tree_selected_bg);
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let theme = dark_theme();
        let lines = render_lines(TreeWidget::new(&[], &theme, true), 10, 2);
        assert!(lines.iter().all(|l| l.is_empty()));
    }
}
