//! Light office theme shared by every window

use egui::{Color32, CornerRadius, Stroke, Style, Visuals};

/// Palette
pub struct Colors;

impl Colors {
    pub const BG_PANEL: Color32 = Color32::from_rgb(245, 246, 248);
    pub const BG_FIELD: Color32 = Color32::from_rgb(255, 255, 255);
    pub const BG_HOVER: Color32 = Color32::from_rgb(229, 236, 246);
    pub const ACCENT: Color32 = Color32::from_rgb(0, 103, 192);
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(32, 33, 36);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(95, 99, 104);
    pub const ERROR: Color32 = Color32::from_rgb(196, 43, 28);
    pub const BORDER: Color32 = Color32::from_rgb(204, 208, 214);
}

pub fn office_theme() -> Style {
    let mut style = Style::default();
    let mut visuals = Visuals::light();

    visuals.panel_fill = Colors::BG_PANEL;
    visuals.window_fill = Colors::BG_PANEL;
    visuals.extreme_bg_color = Colors::BG_FIELD;
    visuals.faint_bg_color = Colors::BG_HOVER;

    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, Colors::BORDER);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Colors::TEXT_PRIMARY);

    for widget in [
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.corner_radius = CornerRadius::same(4);
    }
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Colors::TEXT_PRIMARY);
    visuals.widgets.hovered.bg_fill = Colors::BG_HOVER;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, Colors::ACCENT);
    visuals.widgets.active.bg_fill = Colors::ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = Colors::ACCENT.gamma_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, Colors::ACCENT);

    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 4.0);
    style
}
