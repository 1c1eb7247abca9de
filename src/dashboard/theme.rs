//! Scanner window theme
//!
//! Dark panels around a neutral image area, so scanned pages and the green
//! overlay boxes stay the brightest things on screen.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Window color palette
pub struct ThemeColors;

impl ThemeColors {
    pub const PANEL: Color32 = Color32::from_rgb(24, 25, 30);
    pub const SURFACE: Color32 = Color32::from_rgb(34, 36, 42);
    pub const SURFACE_HOVER: Color32 = Color32::from_rgb(48, 50, 58);
    pub const IMAGE_BG: Color32 = Color32::from_rgb(14, 14, 16);

    pub const ACCENT: Color32 = Color32::from_rgb(82, 160, 240);
    pub const ERROR: Color32 = Color32::from_rgb(231, 76, 60);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(235, 236, 240);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 122, 135);

    pub const BORDER: Color32 = Color32::from_rgb(55, 57, 66);

    /// Drag in progress on the preview
    pub const RUBBER_BAND: Color32 = Color32::from_rgb(0, 150, 255);
    /// Committed ROI on the preview
    pub const SELECTION: Color32 = Color32::from_rgb(255, 200, 0);
}

/// Apply the scanner theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = Visuals::dark();

    visuals.window_fill = ThemeColors::SURFACE;
    visuals.panel_fill = ThemeColors::PANEL;
    visuals.extreme_bg_color = ThemeColors::IMAGE_BG;

    let rounding = Rounding::same(4.0);
    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.open,
    ] {
        widget.rounding = rounding;
        widget.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    }
    visuals.widgets.inactive.bg_fill = ThemeColors::SURFACE;
    visuals.widgets.hovered.bg_fill = ThemeColors::SURFACE_HOVER;
    visuals.widgets.active.bg_fill = ThemeColors::ACCENT;
    visuals.widgets.active.rounding = rounding;

    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT, 77);
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT);
    visuals.window_stroke = Stroke::new(1.0, ThemeColors::BORDER);

    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(20.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}

/// Helper to create a color with modified alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
