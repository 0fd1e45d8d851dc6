use eframe::egui::{self, RichText, Ui};

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{map, panels, prediction, summary, timeseries};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ShorecastApp {
    pub state: AppState,
}

impl ShorecastApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for ShorecastApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: data sources ----
        egui::SidePanel::left("sources_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: dashboard sections ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    maps_section(ui, &mut self.state);
                    ui.separator();
                    analysis_section(ui, &mut self.state);
                    ui.separator();
                    prediction_section(ui, &mut self.state);
                });
        });
    }
}

fn section_heading(ui: &mut Ui, text: &str) {
    ui.add_space(6.0);
    ui.label(RichText::new(text).size(22.0).strong());
    ui.add_space(4.0);
}

/// Map sources two per row.
fn maps_section(ui: &mut Ui, state: &mut AppState) {
    section_heading(ui, "🗺️ Interactive Coastal Maps");
    let n = state.config.map_sources.len();
    for row in 0..n.div_ceil(2) {
        ui.columns(2, |cols: &mut [Ui]| {
            for (offset, col) in cols.iter_mut().enumerate() {
                let index = row * 2 + offset;
                if index < n {
                    col.push_id(("map_panel", index), |ui: &mut Ui| map::map_panel(ui, state, index));
                }
            }
        });
        ui.add_space(12.0);
    }
}

fn analysis_section(ui: &mut Ui, state: &mut AppState) {
    section_heading(ui, "📊 Statistical Analysis");

    let methods = &state.config.analysis_methods;
    let selected = &mut state.session.analysis_method;
    let current = methods.get(*selected).map(|m| m.label.as_str()).unwrap_or("—");
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Select Analysis Method:");
        egui::ComboBox::from_id_salt("analysis_method")
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, method) in methods.iter().enumerate() {
                    ui.selectable_value(selected, i, &method.label);
                }
            });
    });
    ui.add_space(6.0);

    let Some(method) = state.config.analysis_methods.get(state.session.analysis_method).cloned() else {
        return;
    };
    let model = state.analysis();
    let session = &mut state.session;

    ui.columns(2, |cols: &mut [Ui]| match model {
        None => {
            panels::coming_soon(&mut cols[0], &format!("{} - Time Series Analysis", method.label));
            panels::coming_soon(&mut cols[1], &format!("{} - Summary Statistics", method.label));
        }
        Some(Err(err)) => {
            panels::error_panel(&mut cols[0], &err);
            panels::error_panel(&mut cols[1], &err);
        }
        Some(Ok(model)) => {
            cols[0].push_id("time_series_panel", |ui: &mut Ui| {
                timeseries::time_series_panel(ui, &model, &method, &mut session.analysis_transect);
            });
            cols[1].push_id("summary_panel", |ui: &mut Ui| {
                summary::summary_panel(ui, &model.statistics, &method, &mut session.selected_plot);
            });
        }
    });
}

fn prediction_section(ui: &mut Ui, state: &mut AppState) {
    section_heading(ui, "🔮 Prediction");
    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].push_id("bruun_panel", |ui: &mut Ui| prediction::bruun_panel(ui, state));
        cols[1].push_id("regression_panel", |ui: &mut Ui| prediction::regression_panel(ui, state));
    });
}
