use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::ScenarioConfig;
use crate::error::PanelError;
use crate::state::AppState;

const WARNING: Color32 = Color32::from_rgb(0xb2, 0x6b, 0x00);
const ERROR: Color32 = Color32::from_rgb(0xc0, 0x39, 0x2b);
const OK: Color32 = Color32::from_rgb(0x2e, 0x7d, 0x32);

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload data").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.button("⟳ Reload data").clicked() {
            state.reload();
        }

        ui.separator();
        ui.label(format!(
            "Site: {}   Data: {}",
            state.config.site,
            state.config.data_dir.display()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).italics());
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – sources overview
// ---------------------------------------------------------------------------

/// Render the left panel: where each section reads its data from.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("🌊 SHORECAST");
    ui.label(RichText::new("Coastal shoreline change").weak());
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Maps");
            for source in &state.config.map_sources {
                let dir = state.config.data_dir.join(&source.method_dir).join(&state.config.site);
                source_row(ui, &source.title, dir.is_dir());
            }
            ui.add_space(6.0);

            ui.strong("Analysis methods");
            for method in &state.config.analysis_methods {
                match &method.method_dir {
                    Some(dir) => source_row(ui, &method.label, state.config.analysis_dir(dir).is_dir()),
                    None => {
                        ui.label(RichText::new(format!("• {} (coming soon)", method.label)).weak());
                    }
                }
            }
            ui.add_space(6.0);

            ui.strong("Predictions");
            let prediction = &state.config.prediction;
            for method in [&prediction.bruun_method, &prediction.regression_method] {
                source_row(ui, method, state.config.prediction_dir(method).is_dir());
            }
        });
}

fn source_row(ui: &mut Ui, label: &str, present: bool) {
    let (mark, color) = if present { ("✓", OK) } else { ("✗", ERROR) };
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(mark).color(color));
        ui.label(label);
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open data folder")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Data folder changed to {}", dir.display());
        state.set_data_dir(dir);
    }
}

// ---------------------------------------------------------------------------
// Shared widgets
// ---------------------------------------------------------------------------

/// Replace a failed panel's content. Sibling panels are unaffected.
pub fn error_panel(ui: &mut Ui, err: &PanelError) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        match err {
            PanelError::MissingInput(report) => {
                ui.label(RichText::new("⚠ Data files not found!").color(WARNING).strong());
                ui.label("Please ensure the following files exist:");
                for file in &report.files {
                    let (mark, color) = if file.present { ("✓", OK) } else { ("✗", ERROR) };
                    ui.label(
                        RichText::new(format!("{mark} {}: {}", file.label, file.path.display()))
                            .monospace()
                            .color(color),
                    );
                }
            }
            PanelError::SchemaField { .. } => {
                ui.label(RichText::new(format!("❌ {err}")).color(ERROR));
            }
            PanelError::UnexpectedLoad(cause) => {
                ui.label(RichText::new(format!("❌ Error loading data: {cause}")).color(ERROR));
                egui::CollapsingHeader::new("Show detailed error")
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.label(RichText::new(format!("{cause:?}")).monospace());
                    });
            }
        }
    });
}

/// Placeholder for an analysis method without data yet.
pub fn coming_soon(ui: &mut Ui, label: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(format!("ℹ {label}: coming soon")).strong());
        ui.label("Analysis results for this method are not available yet.");
    });
}

/// A labelled figure with an optional signed delta underneath.
pub fn metric(ui: &mut Ui, label: &str, value: &str, delta: Option<&str>) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(20.0).strong());
        if let Some(delta) = delta {
            let color = if delta.starts_with('-') { ERROR } else { OK };
            ui.label(RichText::new(delta).color(color));
        }
    });
}

/// Scenario dropdown bound to an index into `scenarios`.
pub fn scenario_combo(ui: &mut Ui, id: &str, scenarios: &[ScenarioConfig], selected: &mut usize) {
    let current = scenarios.get(*selected).map(|s| s.label.as_str()).unwrap_or("—");
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Select Sea Level Rise Scenario:");
        egui::ComboBox::from_id_salt(id)
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, scenario) in scenarios.iter().enumerate() {
                    ui.selectable_value(selected, i, &scenario.label);
                }
            });
    });
}

/// Transect dropdown; falls back to the first name when nothing valid is
/// selected. Returns the effective selection.
pub fn transect_combo<'a>(ui: &mut Ui, id: &str, names: &[&'a str], selected: &mut Option<String>) -> Option<&'a str> {
    let effective = selected
        .as_deref()
        .and_then(|s| names.iter().copied().find(|n| *n == s))
        .or_else(|| names.first().copied())?;
    let mut choice = effective;
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Select Transect:");
        egui::ComboBox::from_id_salt(id)
            .selected_text(choice)
            .show_ui(ui, |ui: &mut Ui| {
                for &name in names {
                    ui.selectable_value(&mut choice, name, name);
                }
            });
    });
    if choice != effective || selected.is_none() {
        *selected = Some(choice.to_string());
    }
    Some(choice)
}
