//! Theme data model: built-in palettes and resolution from config.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_file_fg: Color,
    pub tree_guide_fg: Color,

    // Details panel
    pub details_label_fg: Color,
    pub details_value_fg: Color,

    // Header and status bar
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & dialogs
    pub border_fg: Color,
    pub dialog_border_fg: Color,

    // Semantic
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_dir_fg: Color::Rgb(137, 180, 250),      // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),
        tree_guide_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)

        details_label_fg: Color::Rgb(166, 173, 200), // #a6adc8 (subtext0)
        details_value_fg: Color::Rgb(205, 214, 244),

        header_fg: Color::Rgb(137, 180, 250),
        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),
        dim_fg: Color::Rgb(108, 112, 134), // #6c7086 (overlay0)
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),             // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218),  // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_dir_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),
        tree_guide_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)

        details_label_fg: Color::Rgb(108, 111, 133), // #6c6f85 (subtext0)
        details_value_fg: Color::Rgb(76, 79, 105),

        header_fg: Color::Rgb(30, 102, 245),
        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190),
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        dim_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)
    }
}

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: start from dark palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Overwrite `slot` when `hex` is present and parses.
fn override_color(slot: &mut Color, hex: Option<&str>) {
    if let Some(color) = hex.and_then(parse_hex_color) {
        *slot = color;
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    override_color(&mut theme.tree_fg, custom.tree_fg.as_deref());
    override_color(&mut theme.tree_selected_bg, custom.tree_selected_bg.as_deref());
    override_color(&mut theme.tree_selected_fg, custom.tree_selected_fg.as_deref());
    override_color(&mut theme.tree_dir_fg, custom.tree_dir_fg.as_deref());
    override_color(&mut theme.tree_file_fg, custom.tree_file_fg.as_deref());
    override_color(&mut theme.details_label_fg, custom.details_label_fg.as_deref());
    override_color(&mut theme.details_value_fg, custom.details_value_fg.as_deref());
    override_color(&mut theme.status_bg, custom.status_bg.as_deref());
    override_color(&mut theme.status_fg, custom.status_fg.as_deref());
    override_color(&mut theme.border_fg, custom.border_fg.as_deref());
    override_color(&mut theme.dialog_border_fg, custom.dialog_border_fg.as_deref());
}
