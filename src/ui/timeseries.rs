use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, LineStyle, Plot};

use crate::color::{ACCRETION_FILL, EROSION_FILL, color_or};
use crate::config::{AnalysisMethodConfig, TimeAxis};
use crate::data::sources::AnalysisModel;
use crate::data::stats::StatisticsTable;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// Time-series panel (cumulative change of one transect)
// ---------------------------------------------------------------------------

pub fn time_series_panel(
    ui: &mut Ui,
    model: &AnalysisModel,
    method: &AnalysisMethodConfig,
    selected: &mut Option<String>,
) {
    ui.heading("📈 Time Series Analysis");

    let names: Vec<&str> = model.transects.iter().map(|t| t.name.as_str()).collect();
    let Some(name) = panels::transect_combo(ui, "analysis_transect", &names, selected) else {
        ui.label("No transect columns (`<transect>_distance_m`) in the time series.");
        return;
    };
    let Some(transect) = model.transects.iter().find(|t| t.name == name) else {
        return;
    };

    let title = match &transect.stats {
        Some(stats) => format!("{}{} | {}", method.title_prefix, transect.name, stats.headline()),
        None => format!("{}{}", method.title_prefix, transect.name),
    };
    plot::chart_title(ui, &title);

    let change = match &transect.change {
        Ok(change) => change,
        Err(err) => {
            ui.colored_label(Color32::from_rgb(0xc0, 0x39, 0x2b), format!("❌ {}: {err}", transect.name));
            return;
        }
    };
    if change.is_empty() {
        ui.label(format!("{} has no measurements.", transect.name));
        return;
    }

    let line_color = color_or(&method.line_color, Color32::from_rgb(0x1f, 0x77, 0xb4));
    let x_label = match model.time_axis {
        TimeAxis::Dates => "Date",
        TimeAxis::Year => "Year",
    };

    let response = Plot::new(("time_series", &transect.name))
        .height(plot::WIDE_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Change (m)")
        .x_axis_formatter(plot::year_formatter)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if change.has_accretion() {
                plot::area_fill(plot_ui, "Accretion", &change.times, &change.accretion, ACCRETION_FILL);
            }
            if change.has_erosion() {
                plot::area_fill(plot_ui, "Erosion", &change.times, &change.erosion, EROSION_FILL);
            }
            plot::zero_line(plot_ui, LineStyle::dashed_loose());
            plot::line_with_markers(plot_ui, &transect.name, &change.times, &change.change, line_color, 2.0);

            let pts = plot::points(&change.times, &change.change);
            plot::nearest_point(plot_ui, pts.iter().enumerate())
        });

    if let Some(i) = response.inner {
        response.response.on_hover_text(model.hover_text(change, i));
    }

    ui.add_space(8.0);
    ui.label(RichText::new("📊 Transect Statistics Summary").strong());
    statistics_table(ui, &model.statistics);
}

/// The statistics table as read, measured columns at two decimals.
pub fn statistics_table(ui: &mut Ui, stats: &StatisticsTable) {
    let headers = &stats.raw.headers;
    let rows = stats.display_rows();
    ui.push_id("statistics_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(240.0)
            .columns(Column::auto().at_least(60.0), headers.len())
            .header(22.0, |mut header| {
                for h in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(h);
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
