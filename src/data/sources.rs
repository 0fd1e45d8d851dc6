//! Data-source registry: turns configured sources into panel models.
//!
//! Every function here checks its expected files first (MissingInput), then
//! loads through the session [`LayerCache`] and builds the model a panel
//! draws. Nothing here touches egui state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use eframe::egui::Color32;

use super::cache::LayerCache;
use super::crs::Crs;
use super::frames::{FrameBuilder, LayerSpec, LayerStyle, MapAnimation};
use super::layout::{resolve_table, resolve_vector};
use super::prediction::{BruunAnalysis, LinearTrend};
use super::series::{CumulativeChange, SeriesLengthMismatch, TimeSeriesTable, cumulative_change, split_accretion_erosion};
use super::stats::{StatisticsTable, TransectStatistic};
use crate::color::{color_or, generate_palette};
use crate::config::{DashboardConfig, LayerConfig, MapSourceConfig, ScenarioConfig, TimeAxis, SCENARIO_YEAR_FIELDS};
use crate::error::{FileReport, PanelError, PanelResult};

/// A memoizable panel result. Errors are shared as well, so a broken file is
/// reported without being re-read on every repaint.
pub type Shared<T> = Result<Arc<T>, Arc<PanelError>>;

/// Wrap a panel result for memoization, logging the failure once.
pub fn share<T>(panel: &str, result: PanelResult<T>) -> Shared<T> {
    match result {
        Ok(model) => Ok(Arc::new(model)),
        Err(err @ PanelError::MissingInput(_)) => {
            log::warn!("{panel}: {err}");
            Err(Arc::new(err))
        }
        Err(err) => {
            log::error!("{panel}: {err}");
            Err(Arc::new(err))
        }
    }
}

const STATISTICS_STEM: &str = "transect_statistics";
const TIME_SERIES_STEM: &str = "time_series_data";

// ---------------------------------------------------------------------------
// Animated maps
// ---------------------------------------------------------------------------

/// `"Change Polygons"` → `"Change Polygon"`
fn singular(label: &str) -> &str {
    label.strip_suffix('s').unwrap_or(label)
}

/// Legend entry and hover title of one configured layer. The layer's own
/// colour wins, then the scenario colour, then `fallback`.
pub fn layer_spec(layer: &LayerConfig, scenario: Option<&ScenarioConfig>, fallback: Color32) -> LayerSpec {
    let color = layer
        .color
        .as_deref()
        .or_else(|| scenario.and_then(|s| s.color.as_deref()))
        .map_or(fallback, |c| color_or(c, fallback));

    let (label, hover_title) = match scenario {
        Some(s) => (
            format!("{} ({})", layer.label, s.label),
            format!("{} ({})", singular(&layer.label), s.label),
        ),
        None => (layer.label.clone(), singular(&layer.label).to_string()),
    };

    LayerSpec {
        style: LayerStyle {
            label,
            color,
            width: layer.width,
        },
        hover_title,
        year_fields: layer.year_fields.clone(),
    }
}

/// Load every layer of a map source and build its animation. `scenario` is
/// ignored for sources without a scenario selector.
pub fn map_animation(
    config: &DashboardConfig,
    cache: &mut LayerCache,
    source: &MapSourceConfig,
    scenario: Option<&ScenarioConfig>,
) -> PanelResult<MapAnimation> {
    let scenario = scenario.filter(|_| source.scenario_select);
    let dir = config.map_dir(source, scenario);
    let paths: Vec<PathBuf> = source
        .layers
        .iter()
        .map(|layer| resolve_vector(&dir, &config.file_stem(&layer.file)))
        .collect();

    let mut report = FileReport::new();
    for (layer, path) in source.layers.iter().zip(&paths) {
        report.expect(&layer.label, path);
    }
    report.check()?;

    let crs = source.crs.as_deref().map(Crs::parse).transpose()?;
    let loaded = paths
        .iter()
        .map(|path| cache.vector(path, crs))
        .collect::<Result<Vec<_>>>()?;

    let fallback = generate_palette(source.layers.len());
    let mut builder = FrameBuilder::new();
    for ((layer, data), color) in source.layers.iter().zip(&loaded).zip(fallback) {
        builder = builder.layer(layer_spec(layer, scenario, color), data);
    }
    let animation = builder.build()?;
    log::info!(
        "{}: {} frames from {} layers",
        source.title,
        animation.frames.len(),
        animation.legend.len()
    );
    Ok(animation)
}

// ---------------------------------------------------------------------------
// Time-series analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TransectSeries {
    pub name: String,
    /// Aborts this transect only.
    pub change: Result<CumulativeChange, SeriesLengthMismatch>,
    pub stats: Option<TransectStatistic>,
}

/// Both analysis slots for one method: the time-series chart and the
/// statistics summary.
#[derive(Debug, Clone)]
pub struct AnalysisModel {
    pub table: TimeSeriesTable,
    pub statistics: StatisticsTable,
    pub transects: Vec<TransectSeries>,
    pub time_axis: TimeAxis,
}

impl AnalysisModel {
    /// Hover text for point `i` of a transect's cumulative change.
    pub fn hover_text(&self, change: &CumulativeChange, i: usize) -> String {
        let row = change.rows[i];
        let mut text = String::new();
        if let Some(Some(date)) = self.table.dates.as_ref().map(|d| d[row]) {
            text.push_str(&format!("Date: {}\n", date.format("%Y-%m-%d")));
        }
        if let Some(year) = self.table.years[row] {
            text.push_str(&format!("Year: {year}\n"));
        }
        text.push_str(&format!(
            "Distance: {:.2} m\nChange: {:.2} m",
            change.distances[i], change.change[i]
        ));
        text
    }
}

pub fn analysis_model(
    config: &DashboardConfig,
    cache: &mut LayerCache,
    method_dir: &str,
    time_axis: TimeAxis,
) -> PanelResult<AnalysisModel> {
    let dir = config.analysis_dir(method_dir);
    let stats_path = resolve_table(&dir, STATISTICS_STEM);
    let series_path = resolve_table(&dir, TIME_SERIES_STEM);

    let mut report = FileReport::new();
    report
        .expect("Transect statistics", &stats_path)
        .expect("Time series", &series_path);
    report.check()?;

    let statistics = StatisticsTable::from_raw((*cache.table(&stats_path)?).clone(), STATISTICS_STEM)?;
    let table = TimeSeriesTable::from_raw(&*cache.table(&series_path)?, TIME_SERIES_STEM)?;

    let times = table.times(time_axis);
    let transects = table
        .transects
        .iter()
        .map(|t| {
            let change = cumulative_change(&times, &t.distances);
            if let Err(e) = &change {
                log::warn!("{method_dir} transect {}: {e}", t.name);
            }
            TransectSeries {
                name: t.name.clone(),
                change,
                stats: statistics.find(&t.name).cloned(),
            }
        })
        .collect();

    Ok(AnalysisModel {
        table,
        statistics,
        transects,
        time_axis,
    })
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

pub fn bruun_analysis(
    config: &DashboardConfig,
    cache: &mut LayerCache,
    scenario: &ScenarioConfig,
) -> PanelResult<BruunAnalysis> {
    let prediction = &config.prediction;
    let dir = config.prediction_dir(&prediction.bruun_method).join(&scenario.dir);
    let historical_path = resolve_vector(&dir, &prediction.historical_file);
    let predicted_path = resolve_vector(&dir, &prediction.predicted_file);

    let mut report = FileReport::new();
    report
        .expect("Historical", &historical_path)
        .expect("Prediction", &predicted_path);
    report.check()?;

    let historical = cache.vector(&historical_path, None)?;
    let predicted = cache.vector(&predicted_path, None)?;
    BruunAnalysis::from_layers(
        &historical,
        &predicted,
        SCENARIO_YEAR_FIELDS,
        [prediction.historical_file.as_str(), prediction.predicted_file.as_str()],
    )
}

/// One transect of the regression panel. Values are positions already
/// relative to the baseline, so they are split into accretion and erosion
/// as read.
#[derive(Debug, Clone)]
pub struct RegressionSeries {
    pub name: String,
    pub years: Vec<f64>,
    pub values: Vec<f64>,
    pub accretion: Vec<f64>,
    pub erosion: Vec<f64>,
    pub fit: Option<LinearTrend>,
    pub stats: Option<TransectStatistic>,
}

impl RegressionSeries {
    pub fn projected_change(&self, target_year: i32) -> Option<f64> {
        let first = *self.years.first()?;
        self.fit.map(|fit| fit.projected_change(first, target_year))
    }
}

#[derive(Debug, Clone)]
pub struct RegressionModel {
    pub transects: Vec<RegressionSeries>,
    pub projection_year: i32,
}

pub fn regression_model(config: &DashboardConfig, cache: &mut LayerCache) -> PanelResult<RegressionModel> {
    let prediction = &config.prediction;
    let dir = config.prediction_dir(&prediction.regression_method);
    let series_path = resolve_table(&dir, &prediction.timeseries_file);
    let stats_path = resolve_table(&dir, &prediction.statistics_file);

    let mut report = FileReport::new();
    report.expect("Predicted time series", &series_path);
    report.check()?;

    let table = TimeSeriesTable::from_raw(&*cache.table(&series_path)?, &prediction.timeseries_file)?;
    let statistics = if stats_path.is_file() {
        Some(StatisticsTable::from_raw(
            (*cache.table(&stats_path)?).clone(),
            &prediction.statistics_file,
        )?)
    } else {
        log::debug!("no {} next to the predictions", stats_path.display());
        None
    };

    let transects = table
        .transects
        .iter()
        .map(|t| {
            let (years, values): (Vec<f64>, Vec<f64>) = table
                .years
                .iter()
                .zip(&t.distances)
                .filter_map(|(y, d)| Some((f64::from((*y)?), (*d)?)))
                .unzip();
            let (accretion, erosion) = split_accretion_erosion(&values);
            RegressionSeries {
                name: t.name.clone(),
                fit: LinearTrend::fit(&years, &values),
                stats: statistics.as_ref().and_then(|s| s.find(&t.name)).cloned(),
                years,
                values,
                accretion,
                erosion,
            }
        })
        .collect();

    Ok(RegressionModel {
        transects,
        projection_year: prediction.projection_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_label_and_colour() {
        let config = DashboardConfig::default();
        let shorelines = &config.map_sources[3].layers[0];
        let scenario = &config.slr_scenarios[4];

        let spec = layer_spec(shorelines, Some(scenario), Color32::GRAY);
        assert_eq!(spec.style.label, "Shorelines (1.0m Sea Level Rise)");
        assert_eq!(spec.hover_title, "Shoreline (1.0m Sea Level Rise)");
        assert_eq!(spec.style.color, Color32::from_rgb(255, 0, 0));
        assert_eq!(spec.style.width, 3.0);

        let plain = layer_spec(shorelines, None, Color32::GRAY);
        assert_eq!(plain.style.label, "Shorelines");
        assert_eq!(plain.style.color, Color32::GRAY);
    }

    #[test]
    fn missing_files_are_reported_not_loaded() {
        let mut config = DashboardConfig::default();
        config.data_dir = std::env::temp_dir().join(format!("shorecast-absent-{}", std::process::id()));
        let mut cache = LayerCache::new();

        let err = map_animation(&config, &mut cache, &config.map_sources[0], None).unwrap_err();
        match err {
            PanelError::MissingInput(report) => {
                assert_eq!(report.files.len(), 4);
                assert_eq!(report.missing().count(), 4);
            }
            other => panic!("expected MissingInput, got {other:?}"),
        }
        assert!(cache.is_empty());

        let err = regression_model(&config, &mut cache).unwrap_err();
        assert!(matches!(err, PanelError::MissingInput(_)));
    }
}
