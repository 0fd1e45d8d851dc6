use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, LineStyle, MarkerShape, Plot, Points, Line, VLine};

use crate::color::{ACCRETION_FILL, EROSION_FILL, color_or, with_alpha};
use crate::data::prediction::{BruunAnalysis, RateTrend, SlopeTrend, YearMetric};
use crate::data::sources::RegressionModel;
use crate::state::AppState;
use crate::ui::{panels, plot};

const HISTORICAL: Color32 = Color32::BLUE;
const PREDICTED_FALLBACK: Color32 = Color32::from_rgb(128, 0, 128);

fn column(metrics: &[YearMetric], value: impl Fn(&YearMetric) -> f64) -> (Vec<f64>, Vec<f64>) {
    metrics.iter().map(|m| (f64::from(m.year), value(m))).unzip()
}

// ---------------------------------------------------------------------------
// Bruun rule prediction
// ---------------------------------------------------------------------------

pub fn bruun_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📈 Bruun Rules Prediction (2025-2100)");
    panels::scenario_combo(
        ui,
        "prediction_scenario",
        &state.config.slr_scenarios,
        &mut state.session.prediction_scenario,
    );
    let Some(scenario) = state.config.slr_scenarios.get(state.session.prediction_scenario).cloned() else {
        return;
    };
    let analysis = match state.bruun() {
        Some(Ok(analysis)) => analysis,
        Some(Err(err)) => {
            panels::error_panel(ui, &err);
            return;
        }
        None => return,
    };
    if analysis.historical.is_empty() {
        ui.label("The historical shorelines have no dated features.");
        return;
    }

    let color = scenario
        .color
        .as_deref()
        .map_or(PREDICTED_FALLBACK, |c| color_or(c, PREDICTED_FALLBACK));

    ui.columns(2, |cols: &mut [Ui]| {
        position_chart(&mut cols[0], &analysis, &scenario.label, color);
        length_chart(&mut cols[1], &analysis, color);
    });
    ui.columns(2, |cols: &mut [Ui]| {
        rate_chart(&mut cols[0], &analysis, color);
        projection_chart(&mut cols[1], &analysis, color);
    });

    ui.add_space(8.0);
    ui.label(RichText::new("📊 Prediction Summary").strong());
    bruun_summary(ui, &analysis, &scenario.label);
}

fn position_chart(ui: &mut Ui, analysis: &BruunAnalysis, scenario: &str, color: Color32) {
    plot::chart_title(ui, &format!("Shoreline Position Change - {scenario}"));
    let (hx, hy) = column(&analysis.historical, |m| m.change_m);
    let (px, py) = column(&analysis.predicted, |m| m.change_m);
    Plot::new("bruun_position")
        .height(plot::GRID_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Position Change (m)")
        .x_axis_formatter(plot::year_formatter)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot::line_with_markers(plot_ui, "Historical", &hx, &hy, HISTORICAL, 2.0);
            plot_ui.line(
                Line::new(plot::points(&px, &py))
                    .name("Predicted")
                    .color(color)
                    .width(2.0)
                    .style(LineStyle::dashed_dense()),
            );
            plot_ui.points(
                Points::new(plot::points(&px, &py))
                    .name("Predicted")
                    .color(color)
                    .shape(MarkerShape::Cross)
                    .radius(4.0),
            );
            plot::zero_line(plot_ui, LineStyle::dashed_loose());
        });
}

fn length_chart(ui: &mut Ui, analysis: &BruunAnalysis, color: Color32) {
    plot::chart_title(ui, "Shoreline Length Over Time");
    let (hx, hy) = column(&analysis.historical, |m| m.length_m);
    let (px, py) = column(&analysis.predicted, |m| m.length_m);
    Plot::new("bruun_length")
        .height(plot::GRID_HEIGHT)
        .x_axis_label("Year")
        .y_axis_label("Shoreline Length (m)")
        .x_axis_formatter(plot::year_formatter)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot::line_with_markers(plot_ui, "Historical Length", &hx, &hy, HISTORICAL, 2.0);
            plot_ui.line(
                Line::new(plot::points(&px, &py))
                    .name("Predicted Length")
                    .color(color)
                    .width(2.0)
                    .style(LineStyle::dashed_dense()),
            );
        });
}

fn rate_chart(ui: &mut Ui, analysis: &BruunAnalysis, color: Color32) {
    plot::chart_title(ui, "Rate of Change Analysis");
    let bars = vec![
        Bar::new(0.0, analysis.historical_rate)
            .width(0.6)
            .fill(HISTORICAL)
            .name(format!("Historical Rate: {:.2} m/yr", analysis.historical_rate)),
        Bar::new(1.0, analysis.predicted_rate)
            .width(0.6)
            .fill(color)
            .name(format!("Predicted Rate: {:.2} m/yr", analysis.predicted_rate)),
    ];
    Plot::new("bruun_rate")
        .height(plot::GRID_HEIGHT)
        .x_axis_label("Period")
        .y_axis_label("Rate (m/year)")
        .x_axis_formatter(plot::category_formatter(vec![
            "Historical Rate".to_string(),
            "Predicted Rate".to_string(),
        ]))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Rate"));
            plot::zero_line(plot_ui, LineStyle::Solid);
        });
}

fn projection_chart(ui: &mut Ui, analysis: &BruunAnalysis, color: Color32) {
    plot::chart_title(ui, "Cumulative Change Projection");
    let (xs, ys): (Vec<f64>, Vec<f64>) = analysis
        .combined()
        .map(|m| (f64::from(m.year), m.change_m))
        .unzip();
    Plot::new("bruun_projection")
        .height(plot::GRID_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Cumulative Change (m)")
        .x_axis_formatter(plot::year_formatter)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot::area_fill(plot_ui, "Cumulative Change", &xs, &ys, with_alpha(color, 0.3));
            plot_ui.line(Line::new(plot::points(&xs, &ys)).name("Cumulative Change").color(color).width(2.0));
            if let Some(start) = analysis.prediction_start() {
                plot_ui.vline(
                    VLine::new(f64::from(start))
                        .name("Prediction Start")
                        .color(Color32::RED)
                        .width(2.0)
                        .style(LineStyle::dashed_loose()),
                );
            }
        });
}

fn bruun_summary(ui: &mut Ui, analysis: &BruunAnalysis, scenario: &str) {
    let span = |metrics: &[YearMetric]| match (metrics.first(), metrics.last()) {
        (Some(a), Some(b)) => format!("{}-{}", a.year, b.year),
        _ => "—".to_string(),
    };
    let last_change = analysis.historical.last().map_or(0.0, |m| m.change_m);
    let (hist_rate, pred_rate) = (analysis.historical_rate, analysis.predicted_rate);

    ui.columns(4, |cols: &mut [Ui]| {
        panels::metric(
            &mut cols[0],
            "Historical Period",
            &span(&analysis.historical),
            Some(&format!("{last_change:.2}m")),
        );
        let predicted_delta = analysis.predicted_period_change().map(|c| format!("{c:.2}m"));
        panels::metric(
            &mut cols[1],
            "Prediction Period",
            &span(&analysis.predicted),
            predicted_delta.as_deref(),
        );
        panels::metric(&mut cols[2], "Historical Rate", &format!("{hist_rate:.2} m/yr"), None);
        panels::metric(
            &mut cols[3],
            "Predicted Rate",
            &format!("{pred_rate:.2} m/yr"),
            Some(&format!("{:+.2} m/yr", pred_rate - hist_rate)),
        );
    });

    ui.add_space(6.0);
    ui.label(RichText::new("📈 Trend Analysis").strong());
    let diff = (pred_rate - hist_rate).abs();
    let (color, description) = match analysis.trend {
        RateTrend::Accelerating => (
            Color32::RED,
            format!("The rate of shoreline change is predicted to increase by {diff:.2} m/yr under {scenario} scenario."),
        ),
        RateTrend::Decelerating => (
            Color32::DARK_GREEN,
            format!("The rate of shoreline change is predicted to decrease by {diff:.2} m/yr under {scenario} scenario."),
        ),
        RateTrend::Stable => (
            Color32::BLUE,
            format!("The rate of shoreline change is predicted to remain stable under {scenario} scenario."),
        ),
    };
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Trend:");
        ui.label(RichText::new(analysis.trend.label()).color(color).strong());
    });
    ui.label(description);
}

// ---------------------------------------------------------------------------
// Regression prediction
// ---------------------------------------------------------------------------

pub fn regression_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📈 Best Curve Fitting - Regression Method");
    let model = match state.regression() {
        Ok(model) => model,
        Err(err) => {
            panels::error_panel(ui, &err);
            return;
        }
    };
    regression_view(ui, &model, &mut state.session.regression_transect);
}

fn regression_view(ui: &mut Ui, model: &RegressionModel, selected: &mut Option<String>) {
    let names: Vec<&str> = model.transects.iter().map(|t| t.name.as_str()).collect();
    let Some(name) = panels::transect_combo(ui, "regression_transect", &names, selected) else {
        ui.label("No transect columns (`<transect>_distance_m`) in the predictions.");
        return;
    };
    let Some(series) = model.transects.iter().find(|t| t.name == name) else {
        return;
    };

    let mut title = format!("Shoreline Position Prediction - {}", series.name);
    if let Some(stats) = &series.stats {
        title.push_str(&format!(
            " | Rate: {:.2}m/yr | Net: {:.2}m",
            stats.rate_m_per_year, stats.net_change_m
        ));
    }
    plot::chart_title(ui, &title);

    let response = Plot::new(("regression", &series.name))
        .height(plot::WIDE_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Position (m)")
        .x_axis_formatter(plot::year_formatter)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if series.accretion.iter().any(|&v| v > 0.0) {
                plot::area_fill(plot_ui, "Accretion Zone", &series.years, &series.accretion, ACCRETION_FILL);
            }
            if series.erosion.iter().any(|&v| v < 0.0) {
                plot::area_fill(plot_ui, "Erosion Zone", &series.years, &series.erosion, EROSION_FILL);
            }
            plot::zero_line(plot_ui, LineStyle::dashed_loose());
            plot::line_with_markers(plot_ui, "Predicted Position", &series.years, &series.values, Color32::RED, 3.0);
            if let (Some(fit), Some(&first), Some(&last)) = (series.fit, series.years.first(), series.years.last()) {
                plot_ui.line(
                    Line::new(vec![[first, fit.at(first)], [last, fit.at(last)]])
                        .name("Linear Trend")
                        .color(Color32::GRAY)
                        .width(1.5)
                        .style(LineStyle::dashed_dense()),
                );
            }

            let pts = plot::points(&series.years, &series.values);
            plot::nearest_point(plot_ui, pts.iter().enumerate())
        });
    if let Some(i) = response.inner {
        response.response.on_hover_text(format!(
            "Year: {:.0}\nPredicted: {:.2}m",
            series.years[i], series.values[i]
        ));
    }

    if let Some(stats) = &series.stats {
        ui.add_space(8.0);
        ui.label(RichText::new("📊 Prediction Statistics").strong());
        ui.columns(4, |cols: &mut [Ui]| {
            panels::metric(&mut cols[0], "Mean Change", &format!("{:.2} m", stats.mean_change_m), None);
            panels::metric(&mut cols[1], "Std Deviation", &format!("{:.2} m", stats.std_dev_m), None);
            panels::metric(&mut cols[2], "Net Change", &format!("{:.2} m", stats.net_change_m), None);
            panels::metric(&mut cols[3], "Rate", &format!("{:.2} m/yr", stats.rate_m_per_year), None);
        });
        ui.label(RichText::new("📈 Extremes").strong());
        ui.columns(3, |cols: &mut [Ui]| {
            panels::metric(&mut cols[0], "Max Erosion", &format!("{:.2} m", stats.max_erosion_m), None);
            panels::metric(&mut cols[1], "Max Accretion", &format!("{:.2} m", stats.max_accretion_m), None);
            panels::metric(&mut cols[2], "N Points", &format!("{:.0}", stats.n_points), None);
        });
    }

    ui.add_space(8.0);
    ui.label(RichText::new("📉 Trend Analysis").strong());
    let Some(fit) = series.fit else {
        ui.label("At least two distinct years are needed for a trend.");
        return;
    };
    let trend = fit.trend();
    let color = match trend {
        SlopeTrend::Accretion => Color32::DARK_GREEN,
        SlopeTrend::Erosion => Color32::RED,
        SlopeTrend::Stable => Color32::BLUE,
    };
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Trend:");
        ui.label(RichText::new(trend.label()).color(color).strong());
    });
    ui.label(format!("Slope: {:.4} m/year", fit.slope));
    if let Some(change) = series.projected_change(model.projection_year) {
        ui.label(format!("Projected change by {}: {change:.2} m", model.projection_year));
    }
}
