use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const BG_PURE_BLACK: Color32 = Color32::from_rgb(0, 0, 0);
pub const BG_PANEL: Color32 = Color32::from_rgb(10, 9, 11);
pub const BG_WIDGET: Color32 = Color32::from_rgb(22, 20, 24);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(34, 30, 36);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(46, 40, 48);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(176, 174, 178);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(112, 108, 116);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(228, 226, 230);

pub const ACCENT_LEFT_EYE: Color32 = Color32::from_rgb(214, 48, 49);
pub const ACCENT_RIGHT_EYE: Color32 = Color32::from_rgb(0, 184, 196);

pub const ACCENT_OK: Color32 = Color32::from_rgb(72, 180, 96);
pub const ACCENT_WARN: Color32 = Color32::from_rgb(214, 150, 48);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(60, 40, 48, 77);

fn widget(bg: Color32, stroke: Stroke, fg: Color32, expansion: f32) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: stroke,
        rounding: Rounding::same(3.0),
        fg_stroke: Stroke::new(1.0, fg),
        expansion,
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.widgets = egui::style::Widgets {
        noninteractive: egui::style::WidgetVisuals {
            weak_bg_fill: BG_PANEL,
            ..widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_MUTED, 0.0)
        },
        inactive: widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_PRIMARY, 0.0),
        hovered: widget(
            BG_WIDGET_HOVER,
            Stroke::new(1.0, ACCENT_RIGHT_EYE),
            TEXT_BRIGHT,
            1.0,
        ),
        active: widget(
            BG_WIDGET_ACTIVE,
            Stroke::new(2.0, ACCENT_LEFT_EYE),
            TEXT_BRIGHT,
            1.0,
        ),
        open: widget(
            BG_WIDGET_ACTIVE,
            Stroke::new(1.0, ACCENT_RIGHT_EYE),
            TEXT_BRIGHT,
            0.0,
        ),
    };
    visuals.selection = egui::style::Selection {
        bg_fill: ACCENT_LEFT_EYE.gamma_multiply(0.4),
        stroke: Stroke::new(1.0, ACCENT_LEFT_EYE),
    };
    visuals.hyperlink_color = ACCENT_RIGHT_EYE;
    visuals.faint_bg_color = BG_PANEL;
    visuals.extreme_bg_color = BG_PURE_BLACK;
    visuals.warn_fg_color = ACCENT_WARN;
    visuals.error_fg_color = ACCENT_LEFT_EYE;
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_fill = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.panel_fill = BG_PANEL;
    visuals.slider_trailing_fill = true;
    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 180.0;

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
