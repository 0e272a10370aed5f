/// Theme system: a light and a dark color theme

use crate::pipeline::regions::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    #[default]
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

/// Colors used by the panels and the plot
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub panel_fill: egui::Color32,
    pub window_fill: egui::Color32,
    pub selection_bg: egui::Color32,
    pub selection_stroke: egui::Color32,

    pub text_muted: egui::Color32,
    pub success: egui::Color32,
    pub warning: egui::Color32,
    pub error: egui::Color32,

    // Plot
    pub original_line: egui::Color32,
    pub processed_line: egui::Color32,
    pub masked_points: egui::Color32,

    pub status_bar_bg: egui::Color32,
    pub status_text: egui::Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0xF7, 0xF7, 0xF8),
            window_fill: egui::Color32::from_rgb(0xFF, 0xFF, 0xFF),
            selection_bg: egui::Color32::from_rgba_premultiplied(0x3B, 0x7D, 0xC0, 0x40),
            selection_stroke: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),
            text_muted: egui::Color32::from_rgb(0x88, 0x8C, 0x94),
            success: egui::Color32::from_rgb(0x2E, 0x7D, 0x32),
            warning: egui::Color32::from_rgb(0xE6, 0x8A, 0x00),
            error: egui::Color32::from_rgb(0xC6, 0x28, 0x28),
            original_line: egui::Color32::from_rgb(0x9E, 0xA3, 0xAB),
            processed_line: egui::Color32::from_rgb(0x1A, 0x3A, 0x6B),
            masked_points: egui::Color32::from_rgb(0xE0, 0x30, 0x30),
            status_bar_bg: egui::Color32::from_rgb(0xEC, 0xED, 0xF0),
            status_text: egui::Color32::from_rgb(0x40, 0x44, 0x4C),
            is_dark: false,
        }
    }

    fn dark() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0x1B, 0x1D, 0x22),
            window_fill: egui::Color32::from_rgb(0x22, 0x25, 0x2B),
            selection_bg: egui::Color32::from_rgba_premultiplied(0x4F, 0x9D, 0xE8, 0x50),
            selection_stroke: egui::Color32::from_rgb(0x4F, 0x9D, 0xE8),
            text_muted: egui::Color32::from_rgb(0x80, 0x86, 0x90),
            success: egui::Color32::from_rgb(0x66, 0xBB, 0x6A),
            warning: egui::Color32::from_rgb(0xFF, 0xB7, 0x4D),
            error: egui::Color32::from_rgb(0xEF, 0x53, 0x50),
            original_line: egui::Color32::from_rgb(0x5C, 0x62, 0x6C),
            processed_line: egui::Color32::from_rgb(0x7F, 0xC8, 0xF8),
            masked_points: egui::Color32::from_rgb(0xFF, 0x6E, 0x6E),
            status_bar_bg: egui::Color32::from_rgb(0x16, 0x18, 0x1C),
            status_text: egui::Color32::from_rgb(0xC8, 0xCC, 0xD4),
            is_dark: true,
        }
    }
}

/// Overlay fill color of a region
pub fn region_color(rgba: Rgba, hovered: bool) -> egui::Color32 {
    let [r, g, b, a] = rgba;
    let alpha = if hovered { a.saturating_mul(2) } else { a };
    egui::Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;
    visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(3);
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);
    visuals.selection.bg_fill = c.selection_bg;
    visuals.selection.stroke = egui::Stroke::new(1.5, c.selection_stroke);

    ctx.set_visuals(visuals);
}
