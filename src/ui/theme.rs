use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

use crate::notify::Level;

pub const ACCENT: Color32 = Color32::from_rgb(0xcc, 0x00, 0x33);  // Scarlet

/// Font family for filled Phosphor icons
pub fn phosphor_fill_family() -> FontFamily {
    FontFamily::Name("phosphor-fill".into())
}

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Phosphor Regular icons as fallback in the Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // Phosphor Fill as its own family, falling back to the default UI font for text
    fonts.font_data.insert(
        "phosphor-fill".into(),
        egui_phosphor::Variant::Fill.font_data(),
    );
    let mut fill_family = vec!["phosphor-fill".to_owned()];
    if let Some(proportional) = fonts.families.get(&FontFamily::Proportional) {
        fill_family.extend(proportional.iter().cloned());
    }
    fonts.families.insert(phosphor_fill_family(), fill_family);

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();
    let mut visuals = Visuals::dark();

    let bg = Color32::from_rgb(14, 14, 16);
    visuals.panel_fill = bg;
    visuals.window_fill = Color32::from_rgb(22, 22, 26);
    visuals.faint_bg_color = Color32::from_rgb(24, 24, 28);
    visuals.extreme_bg_color = Color32::from_rgb(8, 8, 10);

    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(36, 36, 42);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(176, 176, 184));

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(48, 48, 56);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(204, 204, 212));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(70, 70, 80);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = Color32::from_rgb(0xff, 0x5c, 0x7a);

    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(6.0);
    }
    visuals.window_rounding = Rounding::same(8.0);

    style.visuals = visuals;

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(14.0, 7.0);
    style.spacing.window_margin = egui::Margin::same(20.0);

    ctx.set_style(style);
}

/// One color per campus, so blocks on the same campus read as a group
pub fn campus_color(campus: &str) -> Color32 {
    match campus {
        "College Ave" => Color32::from_rgb(0xe0, 0x4f, 0x5f),
        "Busch" => Color32::from_rgb(0x3b, 0x8e, 0xea),
        "Livingston" => Color32::from_rgb(0x2e, 0xb8, 0x72),
        "Cook/Doug" => Color32::from_rgb(0xe5, 0xaa, 0x00),
        _ => Color32::from_rgb(0x9a, 0x9a, 0xa6),
    }
}

/// Returns (fill, stroke) for ghost previews; conflicting ghosts are drawn in red
pub fn ghost_colors(conflicting: bool) -> (Color32, Color32) {
    if conflicting {
        (
            Color32::from_rgba_unmultiplied(0xd0, 0x30, 0x30, 60),
            Color32::from_rgba_unmultiplied(0xff, 0x50, 0x50, 200),
        )
    } else {
        (
            Color32::from_rgba_unmultiplied(0x80, 0x80, 0x90, 50),
            Color32::from_rgba_unmultiplied(0xd0, 0xd0, 0xe0, 180),
        )
    }
}

/// Returns (bg_color, text_color, secondary_text_color) for cards and blocks
pub fn card_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x1c, 0x1c, 0x22),
        Color32::WHITE,
        Color32::from_rgb(176, 176, 184),
    )
}

/// Returns (background, icon) for a toast
pub fn toast_style(level: Level) -> (Color32, &'static str) {
    match level {
        Level::Success => (Color32::from_rgb(0x1e, 0x6b, 0x3c), egui_phosphor::fill::CHECK_CIRCLE),
        Level::Info => (Color32::from_rgb(0x24, 0x4f, 0x8a), egui_phosphor::fill::INFO),
        Level::Warning => (Color32::from_rgb(0x8a, 0x62, 0x10), egui_phosphor::fill::WARNING),
        Level::Error => (Color32::from_rgb(0x8f, 0x1f, 0x1f), egui_phosphor::fill::X_CIRCLE),
    }
}

pub fn status_color(open: bool) -> Color32 {
    if open {
        Color32::from_rgb(0x2e, 0xb8, 0x72)
    } else {
        Color32::from_rgb(0xe0, 0x4f, 0x5f)
    }
}

/// Returns (content_bg, frame_color) for dialogs
pub fn dialog_colors() -> (Color32, Color32) {
    (Color32::from_rgb(14, 14, 16), Color32::from_rgb(48, 48, 56))
}
