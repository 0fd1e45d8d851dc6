use std::ops::RangeInclusive;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{GridMark, HLine, Line, LineStyle, MarkerShape, PlotPoint, PlotPoints, PlotUi, Points, Polygon};

// ---------------------------------------------------------------------------
// Shared chart pieces
// ---------------------------------------------------------------------------

/// Plot height of a chart in a two-column grid.
pub const GRID_HEIGHT: f32 = 260.0;
/// Plot height of a full-width chart.
pub const WIDE_HEIGHT: f32 = 380.0;
/// Pointer distance (px) within which a point shows its hover text.
const HOVER_RADIUS: f32 = 10.0;

pub fn points(xs: &[f64], ys: &[f64]) -> Vec<[f64; 2]> {
    xs.iter().zip(ys).map(|(&x, &y)| [x, y]).collect()
}

/// A line with round markers on every point, both under one legend name.
pub fn line_with_markers(plot_ui: &mut PlotUi, name: &str, xs: &[f64], ys: &[f64], color: Color32, width: f32) {
    plot_ui.line(Line::new(points(xs, ys)).name(name).color(color).width(width));
    plot_ui.points(
        Points::new(points(xs, ys))
            .name(name)
            .color(color)
            .shape(MarkerShape::Circle)
            .radius(3.5),
    );
}

/// Fill between a masked series and zero, one trapezoid per segment so every
/// piece stays convex. All pieces share `name` and so one legend entry.
pub fn area_fill(plot_ui: &mut PlotUi, name: &str, xs: &[f64], ys: &[f64], fill: Color32) {
    for (x, y) in xs.windows(2).zip(ys.windows(2)) {
        if y[0] == 0.0 && y[1] == 0.0 {
            continue;
        }
        let quad = vec![[x[0], 0.0], [x[0], y[0]], [x[1], y[1]], [x[1], 0.0]];
        plot_ui.polygon(
            Polygon::new(PlotPoints::from(quad))
                .name(name)
                .fill_color(fill)
                .stroke(Stroke::NONE),
        );
    }
}

pub fn zero_line(plot_ui: &mut PlotUi, style: LineStyle) {
    plot_ui.hline(HLine::new(0.0).color(Color32::BLACK).width(1.0).style(style));
}

/// Index of the point nearest to the pointer, if it is within the hover
/// radius on screen.
pub fn nearest_point<'p>(
    plot_ui: &PlotUi,
    candidates: impl IntoIterator<Item = (usize, &'p [f64; 2])>,
) -> Option<usize> {
    let pointer = plot_ui.pointer_coordinate()?;
    let pointer = plot_ui.screen_from_plot(pointer);
    candidates
        .into_iter()
        .map(|(i, p)| {
            let screen = plot_ui.screen_from_plot(PlotPoint::new(p[0], p[1]));
            (i, screen.distance(pointer))
        })
        .filter(|&(_, d)| d <= HOVER_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Axis labels for category charts: tick `i` shows `names[i]`.
pub fn category_formatter(names: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        names.get(i as usize).cloned().unwrap_or_default()
    }
}

/// Integer years without thousands separators or decimals.
pub fn year_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract().abs() < 1e-9 {
        format!("{:.0}", mark.value)
    } else {
        format!("{:.1}", mark.value)
    }
}

/// Small centered heading above a chart.
pub fn chart_title(ui: &mut Ui, title: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(title);
    });
}
