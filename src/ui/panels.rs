use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::ui::state::RenderState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub reset_controls: bool,
    pub reset_view: bool,
}

pub struct FrameStats<'a> {
    pub fps: f32,
    pub vertex_count: usize,
    pub feed_error: Option<&'a str>,
}

pub fn draw_side_panel(ctx: &Context, state: &mut RenderState, stats: &FrameStats) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(280.0)
        .max_width(380.0)
        .default_width(300.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Anaglyph 3D").strong());
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("left").color(ACCENT_LEFT_EYE).size(11.0));
                    ui.label(RichText::new("/").color(TEXT_MUTED).size(11.0));
                    ui.label(RichText::new("right").color(ACCENT_RIGHT_EYE).size(11.0));
                });
                ui.add_space(16.0);

                section_header(ui, "STEREO");
                slider(ui, "Convergence", &mut state.convergence, state.convergence_range, "");
                slider(ui, "Eye separation", &mut state.eye_separation, state.eye_separation_range, "");
                slider(ui, "Field of view", &mut state.fov_deg, state.fov_range, "°");
                slider(ui, "Near plane", &mut state.near, state.near_range, "");
                ui.add_space(16.0);

                section_header(ui, "SURFACE");
                light_readout(ui, state);
                ui.add_space(8.0);
                egui::Grid::new("surface_controls")
                    .num_columns(2)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Scale point").color(TEXT_MUTED));
                        ui.label(format!("{:.0}°, {:.0}°", state.scale_point_u, state.scale_point_v));
                        ui.end_row();

                        ui.label(RichText::new("Scale").color(TEXT_MUTED));
                        ui.label(format!("{:.2}", state.controller_scale));
                        ui.end_row();
                    });
                ui.add_space(16.0);

                ui.horizontal(|ui| {
                    if ui.button("Reset controls").clicked() {
                        actions.reset_controls = true;
                    }
                    if ui.button("Reset view").clicked() {
                        actions.reset_view = true;
                    }
                });
                ui.add_space(16.0);

                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "DISPLAY");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut state.vsync_enabled, "VSync");
                    ui.checkbox(&mut state.show_stats, "Stats");
                });
                ui.add_space(16.0);

                if state.show_stats {
                    stats_panel(ui, stats);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn slider(ui: &mut Ui, label: &str, value: &mut f32, range: (f32, f32), suffix: &str) {
    ui.label(label);
    ui.add(egui::Slider::new(value, range.0..=range.1).suffix(suffix));
}

fn light_readout(ui: &mut Ui, state: &RenderState) {
    let pos = state.light.position();
    egui::Grid::new("light").num_columns(2).spacing([16.0, 4.0]).show(ui, |ui| {
        ui.label(RichText::new("Light counter").color(TEXT_MUTED));
        ui.label(format!("{:.2}", state.light.counter));
        ui.end_row();

        ui.label(RichText::new("Light").color(TEXT_MUTED));
        ui.label(format!("({:.2}, {:.0}, {:.2})", pos.x, pos.y, pos.z));
        ui.end_row();
    });
}

fn stats_panel(ui: &mut Ui, stats: &FrameStats) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            let fps_color = if stats.fps >= 60.0 {
                ACCENT_OK
            } else if stats.fps >= 30.0 {
                ACCENT_WARN
            } else {
                ACCENT_LEFT_EYE
            };

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                ui.label(RichText::new("FPS").color(TEXT_MUTED));
                ui.label(RichText::new(format!("{:.0}", stats.fps)).color(fps_color));
                ui.end_row();

                ui.label(RichText::new("Vertices").color(TEXT_MUTED));
                ui.label(RichText::new(fmt_num(stats.vertex_count)).color(TEXT_PRIMARY));
                ui.end_row();

                ui.label(RichText::new("Passes").color(TEXT_MUTED));
                ui.label(RichText::new("bg + 2 eyes").color(TEXT_PRIMARY));
                ui.end_row();
            });

            ui.add_space(8.0);

            let status = match stats.feed_error {
                Some(_) => RichText::new("Feed error").color(ACCENT_LEFT_EYE),
                None => RichText::new("Feed ok").color(ACCENT_OK),
            };
            ui.horizontal(|ui| {
                ui.label(RichText::new("Background:").color(TEXT_MUTED));
                ui.label(status);
            });
        });

    if let Some(err) = stats.feed_error {
        ui.add_space(6.0);
        egui::Frame::default()
            .fill(Color32::from_rgb(40, 15, 15))
            .stroke(egui::Stroke::new(1.0, ACCENT_LEFT_EYE))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(err).color(ACCENT_LEFT_EYE).size(11.0));
            });
    }
}

pub fn draw_help_overlay(ctx: &Context) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Rotate | \u{2190}/\u{2192} - Light").color(TEXT_MUTED));
                    ui.label(RichText::new("WASD - Scale point | +/- - Scale | R - Reset view").color(TEXT_MUTED));
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_counts_are_abbreviated() {
        assert_eq!(fmt_num(999), "999");
        assert_eq!(fmt_num(65_702), "65.7K");
        assert_eq!(fmt_num(2_500_000), "2.50M");
    }
}
