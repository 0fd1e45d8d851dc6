//! Dashboard configuration.
//!
//! Every field has a default that reproduces the stock CATALANGA dashboard,
//! so a config file is optional. Resolution order:
//! `SHORECAST_CONFIG` (path to JSON) → `./shorecast.json` → defaults,
//! then `SHORECAST_DATA_DIR` overrides the data root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "SHORECAST_CONFIG";
pub const DATA_DIR_ENV: &str = "SHORECAST_DATA_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "shorecast.json";

/// Year-field aliases probed on shoreline layers.
pub const SHORELINE_YEAR_FIELDS: &[&str] = &["year", "Year", "YEAR", "date", "Date"];
/// Year-field aliases probed on change polygons and intersections.
pub const END_YEAR_FIELDS: &[&str] = &["end_year", "endYear", "year", "Year", "YEAR"];
/// Year-field aliases probed on scenario / prediction shorelines.
pub const SCENARIO_YEAR_FIELDS: &[&str] = &["year", "Year", "YEAR"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root of the `data/<method>/<site>/...` tree.
    pub data_dir: PathBuf,
    pub site: String,
    pub map_sources: Vec<MapSourceConfig>,
    pub analysis_methods: Vec<AnalysisMethodConfig>,
    pub slr_scenarios: Vec<ScenarioConfig>,
    pub prediction: PredictionConfig,
}

/// One animated map panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSourceConfig {
    /// Stable identifier used for widget ids and session state.
    pub id: String,
    pub title: String,
    /// Directory under the data root, e.g. `CoastSat`.
    pub method_dir: String,
    /// Read layers from `<site>/<scenario dir>/` and colour them per scenario.
    pub scenario_select: bool,
    /// Source reference override (e.g. `EPSG:32651`) for files without a
    /// `crs` member.
    pub crs: Option<String>,
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub key: String,
    /// Legend label.
    pub label: String,
    /// File stem; `{site}` is replaced by the site name. The extension is
    /// resolved on disk (`.geojson`, then `.json`).
    pub file: String,
    /// Candidate year fields in priority order. Empty means the layer is
    /// static (drawn unchanged in every frame).
    pub year_fields: Vec<String>,
    /// Colour string; `None` takes the scenario colour or a palette colour.
    pub color: Option<String>,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxis {
    /// Decimal year of the `dates` column.
    Dates,
    /// The `year` column.
    Year,
}

/// One entry of the "Select Analysis Method" dropdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisMethodConfig {
    pub label: String,
    /// `None` renders a "coming soon" panel.
    pub method_dir: Option<String>,
    /// Prepended to time-series titles, e.g. `"Method 3 - "`.
    pub title_prefix: String,
    /// Appended to summary subplot titles, e.g. `" (Microsoft)"`.
    pub title_suffix: String,
    pub time_axis: TimeAxis,
    pub line_color: String,
    pub negative_color: String,
    pub positive_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub label: String,
    pub dir: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Bruun-rule shoreline prediction method directory under `Prediction/`.
    pub bruun_method: String,
    /// Regression prediction method directory under `Prediction/`.
    pub regression_method: String,
    pub historical_file: String,
    pub predicted_file: String,
    pub timeseries_file: String,
    pub statistics_file: String,
    /// Year used for the "projected change by" line of the regression trend.
    pub projection_year: i32,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            label: String::new(),
            file: String::new(),
            year_fields: Vec::new(),
            color: None,
            width: 2.0,
        }
    }
}

impl LayerConfig {
    fn new(key: &str, label: &str, file: &str, year_fields: &[&str], color: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            file: file.to_string(),
            year_fields: strings(year_fields),
            color: color.map(str::to_string),
            width: 2.0,
        }
    }
}

impl Default for MapSourceConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            method_dir: String::new(),
            scenario_select: false,
            crs: None,
            layers: Vec::new(),
        }
    }
}

/// The four-layer CoastSat-style map (shorelines, change polygons,
/// intersections, transects).
fn full_map(id: &str, title: &str, method_dir: &str, colors: [&str; 4]) -> MapSourceConfig {
    let [transect, shoreline, intersection, polygon] = colors;
    MapSourceConfig {
        id: id.to_string(),
        title: title.to_string(),
        method_dir: method_dir.to_string(),
        layers: vec![
            LayerConfig::new("transects", "Transects", "{site}_transects", &[], Some(transect)),
            LayerConfig::new(
                "change_polygons",
                "Change Polygons",
                "{site}_change_polygons",
                END_YEAR_FIELDS,
                Some(polygon),
            ),
            LayerConfig::new(
                "shorelines",
                "Shorelines",
                "{site}_shorelines",
                SHORELINE_YEAR_FIELDS,
                Some(shoreline),
            ),
            LayerConfig::new(
                "intersections",
                "Intersections",
                "{site}_intersections",
                END_YEAR_FIELDS,
                Some(intersection),
            ),
        ],
        ..Default::default()
    }
}

impl Default for AnalysisMethodConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            method_dir: None,
            title_prefix: String::new(),
            title_suffix: String::new(),
            time_axis: TimeAxis::Dates,
            line_color: "#1f77b4".to_string(),
            negative_color: "#ff6b6b".to_string(),
            positive_color: "#4ecdc4".to_string(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            dir: String::new(),
            color: None,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            bruun_method: "Pre1".to_string(),
            regression_method: "Pre2".to_string(),
            historical_file: "shorelines_2019_2024".to_string(),
            predicted_file: "shorelines_2025_2100".to_string(),
            timeseries_file: "transect_timeseries_predicted".to_string(),
            statistics_file: "coastal_change_statistics_predicted".to_string(),
            projection_year: 2030,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let scenario = |label: &str, dir: &str, color: &str| ScenarioConfig {
            label: label.to_string(),
            dir: dir.to_string(),
            color: Some(color.to_string()),
        };

        Self {
            data_dir: PathBuf::from("data"),
            site: "CATALANGA".to_string(),
            map_sources: vec![
                full_map(
                    "coastsat",
                    "CoastSat Method - Google Earth Engine (Landsat 8, 9 Satellites)",
                    "CoastSat",
                    ["rgba(0, 128, 0, 0.5)", "blue", "orange", "rgba(0, 0, 255, 0.15)"],
                ),
                full_map(
                    "microsoft",
                    "Microsoft Planetary Computer",
                    "Microsoft",
                    ["rgba(128, 0, 128, 0.5)", "#ff6b6b", "gold", "rgba(255, 107, 107, 0.15)"],
                ),
                MapSourceConfig {
                    id: "method3".to_string(),
                    title: "Best Curve Fitting Method".to_string(),
                    method_dir: "Method3".to_string(),
                    layers: vec![
                        LayerConfig::new(
                            "transects",
                            "Transects",
                            "{site}_transects",
                            &[],
                            Some("rgba(255, 193, 7, 0.5)"),
                        ),
                        LayerConfig::new(
                            "shorelines",
                            "Shorelines",
                            "{site}_shorelines",
                            SHORELINE_YEAR_FIELDS,
                            Some("darkred"),
                        ),
                    ],
                    ..Default::default()
                },
                MapSourceConfig {
                    id: "method4".to_string(),
                    title: "Bruun Rule Method".to_string(),
                    method_dir: "Method4".to_string(),
                    scenario_select: true,
                    layers: vec![LayerConfig {
                        width: 3.0,
                        ..LayerConfig::new(
                            "shorelines",
                            "Shorelines",
                            "shorelines_2019_2024",
                            SCENARIO_YEAR_FIELDS,
                            None,
                        )
                    }],
                    ..Default::default()
                },
            ],
            analysis_methods: vec![
                AnalysisMethodConfig {
                    label: "Google Earth Engine".to_string(),
                    method_dir: Some("CoastSat".to_string()),
                    ..Default::default()
                },
                AnalysisMethodConfig {
                    label: "Microsoft Planetary Computer".to_string(),
                    method_dir: Some("Microsoft".to_string()),
                    title_suffix: " (Microsoft)".to_string(),
                    line_color: "#ff6b6b".to_string(),
                    negative_color: "#e74c3c".to_string(),
                    positive_color: "#3498db".to_string(),
                    ..Default::default()
                },
                AnalysisMethodConfig {
                    label: "Best Curve Fitting".to_string(),
                    method_dir: Some("Method3".to_string()),
                    title_prefix: "Method 3 - ".to_string(),
                    time_axis: TimeAxis::Year,
                    line_color: "darkorange".to_string(),
                    ..Default::default()
                },
                AnalysisMethodConfig {
                    label: "Method 4".to_string(),
                    ..Default::default()
                },
                AnalysisMethodConfig {
                    label: "Other Method".to_string(),
                    ..Default::default()
                },
            ],
            slr_scenarios: vec![
                scenario("0.1m Sea Level Rise", "SLR_0_1m", "blue"),
                scenario("0.2m Sea Level Rise", "SLR_0_2m", "green"),
                scenario("0.3m Sea Level Rise", "SLR_0_3m", "gold"),
                scenario("0.5m Sea Level Rise", "SLR_0_5m", "orange"),
                scenario("1.0m Sea Level Rise", "SLR_1_0m", "red"),
            ],
            prediction: PredictionConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl DashboardConfig {
    /// Resolve the configuration from the environment and working directory.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if fallback.is_file() => Self::from_file(&fallback)?,
            None => {
                log::info!("No {DEFAULT_CONFIG_FILE} found, using built-in configuration");
                Self::default()
            }
        };

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    // -- Conventional path layout --

    /// `data/<method>/<site>[/<scenario>]`
    pub fn map_dir(&self, source: &MapSourceConfig, scenario: Option<&ScenarioConfig>) -> PathBuf {
        let mut dir = self.data_dir.join(&source.method_dir).join(&self.site);
        if let Some(s) = scenario {
            dir.push(&s.dir);
        }
        dir
    }

    /// `data/<method>/<site>/Column1Graph`
    pub fn analysis_dir(&self, method_dir: &str) -> PathBuf {
        self.data_dir
            .join(method_dir)
            .join(&self.site)
            .join("Column1Graph")
    }

    /// `data/Prediction/<method>/<site>`
    pub fn prediction_dir(&self, method: &str) -> PathBuf {
        self.data_dir.join("Prediction").join(method).join(&self.site)
    }

    /// Expand `{site}` in a configured file stem.
    pub fn file_stem(&self, template: &str) -> String {
        template.replace("{site}", &self.site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_stock_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(config.site, "CATALANGA");
        assert_eq!(config.map_sources.len(), 4);
        assert_eq!(config.analysis_methods.len(), 5);
        assert_eq!(config.slr_scenarios.len(), 5);
        assert!(config.map_sources[3].scenario_select);
        assert!(config.map_sources[0].layers[0].year_fields.is_empty());
        assert!(config.analysis_methods[3].method_dir.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DashboardConfig::from_json(
            r#"{"site": "BOLINAO", "prediction": {"projection_year": 2050}}"#,
        )
        .unwrap();
        assert_eq!(config.site, "BOLINAO");
        assert_eq!(config.prediction.projection_year, 2050);
        assert_eq!(config.prediction.bruun_method, "Pre1");
        assert_eq!(config.map_sources.len(), 4);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(DashboardConfig::from_json(r#"{"site": 3"#).is_err());
    }

    #[test]
    fn conventional_paths() {
        let config = DashboardConfig::default();
        let source = &config.map_sources[3];
        let scenario = &config.slr_scenarios[2];
        assert_eq!(
            config.map_dir(source, Some(scenario)),
            PathBuf::from("data/Method4/CATALANGA/SLR_0_3m")
        );
        assert_eq!(
            config.analysis_dir("CoastSat"),
            PathBuf::from("data/CoastSat/CATALANGA/Column1Graph")
        );
        assert_eq!(
            config.prediction_dir("Pre2"),
            PathBuf::from("data/Prediction/Pre2/CATALANGA")
        );
        assert_eq!(config.file_stem("{site}_shorelines"), "CATALANGA_shorelines");
    }
}
