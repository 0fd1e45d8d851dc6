use std::time::Duration;

use eframe::egui::{self, RichText, Stroke, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, Points, Polygon};

use crate::color::with_alpha;
use crate::data::frames::{Frame, MapAnimation, Primitive};
use crate::state::AppState;
use crate::ui::{panels, plot};

/// Seconds each year stays on screen while playing.
const FRAME_SECONDS: f64 = 1.0;
const MAP_HEIGHT: f32 = 420.0;

// ---------------------------------------------------------------------------
// Animated map panel
// ---------------------------------------------------------------------------

/// Render map source `index`: scenario selector (if any), playback
/// controls, and the current year's layers.
pub fn map_panel(ui: &mut Ui, state: &mut AppState, index: usize) {
    let Some(source) = state.config.map_sources.get(index) else {
        return;
    };
    ui.heading(&source.title);
    if source.scenario_select {
        panels::scenario_combo(
            ui,
            &format!("map_scenario_{index}"),
            &state.config.slr_scenarios,
            &mut state.session.map_scenario,
        );
    }

    let animation = match state.map(index) {
        Some(Ok(animation)) => animation,
        Some(Err(err)) => {
            panels::error_panel(ui, &err);
            return;
        }
        None => return,
    };
    if animation.frames.is_empty() {
        ui.label("No dated features to animate.");
        return;
    }
    let Some(anim) = state.session.maps.get_mut(index) else {
        return;
    };

    let n = animation.frames.len();
    let now = ui.input(|i| i.time);
    if anim.playing {
        anim.tick(now, FRAME_SECONDS, n);
        ui.ctx().request_repaint_after(Duration::from_secs_f64(FRAME_SECONDS));
    }

    let mut current = anim.current(n).unwrap_or(0);
    let years: Vec<i32> = animation.years().collect();
    ui.horizontal(|ui: &mut Ui| {
        let label = if anim.playing { "⏸ Pause" } else { "▶ Play" };
        if ui.button(label).clicked() {
            if anim.playing {
                anim.playing = false;
            } else {
                anim.play(now, n);
                current = anim.current(n).unwrap_or(0);
            }
        }
        let year_label = RichText::new(format!("Year: {}", years[current.min(n - 1)])).strong();
        let slider = egui::Slider::new(&mut current, 0..=n - 1)
            .show_value(false)
            .text(year_label);
        if ui.add(slider).changed() {
            anim.frame = Some(current);
            anim.playing = false;
        }
    });

    draw_frame(ui, &animation, &animation.frames[current.min(n - 1)], index);
}

fn draw_frame(ui: &mut Ui, animation: &MapAnimation, frame: &Frame, index: usize) {
    let mut map = Plot::new(("map", index))
        .height(MAP_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_scroll(false)
        .allow_boxed_zoom(true);

    if let Some(bounds) = animation.bounds {
        let center_lat = bounds.center().y;
        // One pixel covers the same ground distance on both axes.
        map = map
            .data_aspect((1.0 / center_lat.to_radians().cos().max(0.1)) as f32)
            .include_x(bounds.min().x)
            .include_x(bounds.max().x)
            .include_y(bounds.min().y)
            .include_y(bounds.max().y);
    }

    let response = map.show(ui, |plot_ui| {
        let mut vertices: Vec<(&Primitive, &[f64; 2])> = Vec::new();
        for layer in &frame.layers {
            let style = &animation.legend[layer.layer];
            if layer.primitives.is_empty() {
                // Keeps the legend entry while the layer has nothing this year.
                plot_ui.line(Line::new(Vec::<[f64; 2]>::new()).name(&style.label).color(style.color));
                continue;
            }

            let mut dots = Vec::new();
            for primitive in layer.primitives.iter() {
                match primitive {
                    Primitive::Line { coords, .. } => plot_ui.line(
                        Line::new(coords.clone())
                            .name(&style.label)
                            .color(style.color)
                            .width(style.width),
                    ),
                    Primitive::Point { coord, .. } => dots.push(*coord),
                    Primitive::Polygon { ring, .. } => plot_ui.polygon(
                        Polygon::new(ring.clone())
                            .name(&style.label)
                            .fill_color(with_alpha(style.color, 0.15))
                            .stroke(Stroke::new(1.0, style.color)),
                    ),
                }
                vertices.extend(primitive.vertices().iter().map(|v| (primitive, v)));
            }
            if !dots.is_empty() {
                plot_ui.points(
                    Points::new(dots)
                        .name(&style.label)
                        .color(style.color)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(style.width + 2.0),
                );
            }
        }

        plot::nearest_point(plot_ui, vertices.iter().map(|(_, v)| *v).enumerate())
            .map(|i| vertices[i].0.label().to_string())
    });

    if let Some(text) = response.inner {
        response.response.on_hover_text(text);
    }
}
