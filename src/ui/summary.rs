use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, LineStyle, Plot, PlotUi};

use crate::color::color_or;
use crate::config::AnalysisMethodConfig;
use crate::data::stats::{StatisticsTable, sign_color};
use crate::state::SummaryPlot;
use crate::ui::plot;

const EROSION_BAR: Color32 = Color32::from_rgb(0xff, 0x6b, 0x6b);
const ACCRETION_BAR: Color32 = Color32::from_rgb(0x4e, 0xcd, 0xc4);
const MEAN_LINE: Color32 = Color32::from_rgb(0x34, 0x98, 0xdb);
const STD_BAR: Color32 = Color32::from_rgb(0x95, 0xa5, 0xa6);

fn title(kind: SummaryPlot) -> &'static str {
    match kind {
        SummaryPlot::NetChange => "Net Coastal Change by Transect",
        SummaryPlot::Rate => "Annual Rate of Change",
        SummaryPlot::ErosionVsAccretion => "Maximum Erosion vs Accretion",
        SummaryPlot::MeanStd => "Mean Change ± Std Dev",
    }
}

fn y_label(kind: SummaryPlot) -> &'static str {
    match kind {
        SummaryPlot::NetChange => "Net Change (m)",
        SummaryPlot::Rate => "Rate (m/year)",
        SummaryPlot::ErosionVsAccretion => "Distance (m)",
        SummaryPlot::MeanStd => "Mean Change (m)",
    }
}

// ---------------------------------------------------------------------------
// Summary panel: 2×2 grid plus one optional enlarged chart
// ---------------------------------------------------------------------------

pub fn summary_panel(
    ui: &mut Ui,
    stats: &StatisticsTable,
    method: &AnalysisMethodConfig,
    selected_plot: &mut Option<SummaryPlot>,
) {
    ui.heading("📊 Summary Statistics");
    if stats.rows.is_empty() {
        ui.label("The statistics table has no rows.");
        return;
    }

    for pair in SummaryPlot::ALL.chunks(2) {
        ui.columns(2, |cols: &mut [Ui]| {
            for (col, &kind) in cols.iter_mut().zip(pair) {
                summary_chart(col, kind, stats, method, plot::GRID_HEIGHT, "grid");
            }
        });
    }

    ui.add_space(8.0);
    ui.label(RichText::new("🔍 View Individual Plots").strong());
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for kind in SummaryPlot::ALL {
            if ui.selectable_label(*selected_plot == Some(kind), kind.button_label()).clicked() {
                *selected_plot = Some(kind);
            }
        }
        if ui.button("❌").on_hover_text("Close individual plot").clicked() {
            *selected_plot = None;
        }
    });

    if let Some(kind) = *selected_plot {
        summary_chart(ui, kind, stats, method, plot::WIDE_HEIGHT, "single");
    }
}

fn summary_chart(
    ui: &mut Ui,
    kind: SummaryPlot,
    stats: &StatisticsTable,
    method: &AnalysisMethodConfig,
    height: f32,
    slot: &str,
) {
    plot::chart_title(ui, &format!("{}{}", title(kind), method.title_suffix));
    let names: Vec<String> = stats.rows.iter().map(|r| r.transect.clone()).collect();

    Plot::new(("summary", kind as u8, slot))
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Transect")
        .y_axis_label(y_label(kind))
        .x_axis_formatter(plot::category_formatter(names))
        .allow_scroll(false)
        .show(ui, |plot_ui| match kind {
            SummaryPlot::NetChange => {
                sign_bars(plot_ui, "Net Change", stats.rows.iter().map(|r| r.net_change_m), method);
            }
            SummaryPlot::Rate => {
                sign_bars(plot_ui, "Rate", stats.rows.iter().map(|r| r.rate_m_per_year), method);
            }
            SummaryPlot::ErosionVsAccretion => {
                let side = |values: Vec<f64>, offset: f64, color: Color32, name: &str| {
                    let bars = values
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| {
                            Bar::new(i as f64 + offset, v)
                                .width(0.4)
                                .fill(color)
                                .name(format!("{}: {v:.2} m", stats.rows[i].transect))
                        })
                        .collect();
                    BarChart::new(bars).name(name).color(color)
                };
                let erosion = stats.rows.iter().map(|r| r.max_erosion_m).collect();
                let accretion = stats.rows.iter().map(|r| r.max_accretion_m).collect();
                plot_ui.bar_chart(side(erosion, -0.2, EROSION_BAR, "Max Erosion"));
                plot_ui.bar_chart(side(accretion, 0.2, ACCRETION_BAR, "Max Accretion"));
                plot::zero_line(plot_ui, LineStyle::Solid);
            }
            SummaryPlot::MeanStd => {
                let xs: Vec<f64> = (0..stats.rows.len()).map(|i| i as f64).collect();
                let means: Vec<f64> = stats.rows.iter().map(|r| r.mean_change_m).collect();
                for (x, r) in xs.iter().zip(&stats.rows) {
                    let lo = r.mean_change_m - r.std_dev_m;
                    let hi = r.mean_change_m + r.std_dev_m;
                    plot_ui.line(
                        Line::new(vec![[*x, lo], [*x, hi]])
                            .name("± Std Dev")
                            .color(STD_BAR)
                            .width(2.0),
                    );
                }
                plot::line_with_markers(plot_ui, "Mean Change", &xs, &means, MEAN_LINE, 2.0);
                plot::zero_line(plot_ui, LineStyle::dashed_loose());
            }
        });
}

/// One bar per transect, coloured by the sign of its value.
fn sign_bars(plot_ui: &mut PlotUi, name: &str, values: impl Iterator<Item = f64>, method: &AnalysisMethodConfig) {
    let negative = color_or(&method.negative_color, EROSION_BAR);
    let positive = color_or(&method.positive_color, ACCRETION_BAR);
    let bars = values
        .enumerate()
        .map(|(i, v)| {
            Bar::new(i as f64, v)
                .width(0.7)
                .fill(sign_color(v, negative, positive))
                .name(format!("{v:.2}"))
        })
        .collect();
    plot_ui.bar_chart(BarChart::new(bars).name(name));
    plot::zero_line(plot_ui, LineStyle::Solid);
}
