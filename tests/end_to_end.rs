//! Drives the per-panel data sources against small on-disk data trees.

use std::fs;
use std::path::PathBuf;

use shorecast::config::DashboardConfig;
use shorecast::data::cache::LayerCache;
use shorecast::data::prediction::{RateTrend, SlopeTrend};
use shorecast::data::sources::{analysis_model, bruun_analysis, map_animation, regression_model};
use shorecast::error::PanelError;

/// A scratch data root removed on drop.
struct DataTree {
    root: PathBuf,
    config: DashboardConfig,
}

impl DataTree {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("shorecast-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = root.clone();
        DataTree { root, config }
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for DataTree {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn collection(features: &[String]) -> String {
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
}

fn line_feature(coords: &str, props: &str) -> String {
    format!(r#"{{"type":"Feature","geometry":{{"type":"LineString","coordinates":{coords}}},"properties":{props}}}"#)
}

fn point_feature(coord: &str, props: &str) -> String {
    format!(r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":{coord}}},"properties":{props}}}"#)
}

fn null_feature(props: &str) -> String {
    format!(r#"{{"type":"Feature","geometry":null,"properties":{props}}}"#)
}

fn write_coastsat_map(tree: &DataTree) {
    let dir = "CoastSat/CATALANGA";
    tree.write(
        &format!("{dir}/CATALANGA_transects.geojson"),
        &collection(&[line_feature("[[121.0,14.0],[121.001,14.0]]", r#"{"name":"T1"}"#)]),
    );
    tree.write(
        &format!("{dir}/CATALANGA_shorelines.geojson"),
        &collection(&[
            line_feature("[[121.0,14.0],[121.0,14.01]]", r#"{"year":2019}"#),
            line_feature("[[121.0005,14.0],[121.0005,14.01]]", r#"{"year":2021}"#),
            null_feature(r#"{"year":2020}"#),
        ]),
    );
    tree.write(
        &format!("{dir}/CATALANGA_intersections.geojson"),
        &collection(&[point_feature("[121.0005,14.0]", r#"{"end_year":2021,"transect":"T1"}"#)]),
    );
    tree.write(
        &format!("{dir}/CATALANGA_change_polygons.geojson"),
        &collection(&[format!(
            r#"{{"type":"Feature","geometry":{{"type":"Polygon","coordinates":[[[121.0,14.0],[121.0005,14.0],[121.0005,14.01],[121.0,14.0]]]}},"properties":{{"end_year":2020}}}}"#
        )]),
    );
}

#[test]
fn map_source_builds_one_frame_per_year() {
    let tree = DataTree::new("map");
    write_coastsat_map(&tree);
    let mut cache = LayerCache::new();

    let source = &tree.config.map_sources[0];
    let animation = map_animation(&tree.config, &mut cache, source, None).unwrap();

    assert_eq!(animation.years().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
    assert_eq!(animation.legend.len(), 4);
    assert_eq!(animation.default_frame().map(|f| f.year), Some(2021));

    // Transects are static and present in every frame.
    let transects = source.layers.iter().position(|l| l.key == "transects").unwrap();
    for frame in &animation.frames {
        assert_eq!(frame.layers[transects].primitives.len(), 1);
    }
    // The null-geometry shoreline was dropped, so 2020 has no shoreline.
    let shorelines = source.layers.iter().position(|l| l.key == "shorelines").unwrap();
    assert!(animation.frames[1].layers[shorelines].primitives.is_empty());
    assert_eq!(animation.frames[2].layers[shorelines].primitives.len(), 1);

    assert_eq!(cache.len(), 4);
    map_animation(&tree.config, &mut cache, source, None).unwrap();
    assert_eq!(cache.len(), 4, "second build is served from the cache");
}

#[test]
fn partial_map_inputs_list_each_missing_file() {
    let tree = DataTree::new("partial");
    tree.write(
        "CoastSat/CATALANGA/CATALANGA_shorelines.geojson",
        &collection(&[line_feature("[[121.0,14.0],[121.0,14.01]]", r#"{"year":2019}"#)]),
    );
    let mut cache = LayerCache::new();

    let err = map_animation(&tree.config, &mut cache, &tree.config.map_sources[0], None).unwrap_err();
    let PanelError::MissingInput(report) = err else {
        panic!("expected a missing-input report");
    };
    let missing: Vec<&str> = report.missing().map(|f| f.label.as_str()).collect();
    assert_eq!(missing, vec!["Transects", "Change Polygons", "Intersections"]);
    assert!(cache.is_empty());
}

#[test]
fn layer_without_year_field_is_a_schema_error() {
    let tree = DataTree::new("schema");
    write_coastsat_map(&tree);
    tree.write(
        "CoastSat/CATALANGA/CATALANGA_shorelines.geojson",
        &collection(&[line_feature("[[121.0,14.0],[121.0,14.01]]", r#"{"when":"2019"}"#)]),
    );
    let mut cache = LayerCache::new();

    let err = map_animation(&tree.config, &mut cache, &tree.config.map_sources[0], None).unwrap_err();
    assert!(matches!(err, PanelError::SchemaField { .. }), "{err:?}");
    assert!(err.to_string().contains("year"));
}

#[test]
fn analysis_method_reads_series_and_statistics() {
    let tree = DataTree::new("analysis");
    let dir = "CoastSat/CATALANGA/Column1Graph";
    tree.write(
        &format!("{dir}/time_series_data.csv"),
        "dates,year,T1_distance_m,T2_distance_m\n\
         2019-02-11 02:12:00+00:00,2019,100.0,50.0\n\
         2020-02-11 02:12:00+00:00,2020,,48.0\n\
         2021-02-11 02:12:00+00:00,2021,103.5,47.0\n",
    );
    tree.write(
        &format!("{dir}/transect_statistics.csv"),
        "Transect,Mean_Change_m,Std_Dev_m,Max_Erosion_m,Max_Accretion_m,Net_Change_m,Rate_m_per_year,N_Points\n\
         T1,1.75,2.47,0.0,3.5,3.5,1.75,2\n\
         T2,-1.67,1.53,-3.0,0.0,-3.0,-1.5,3\n",
    );
    let mut cache = LayerCache::new();
    let method = &tree.config.analysis_methods[0];

    let model = analysis_model(
        &tree.config,
        &mut cache,
        method.method_dir.as_deref().unwrap(),
        method.time_axis,
    )
    .unwrap();

    assert_eq!(model.transects.len(), 2);
    let t1 = &model.transects[0];
    let change = t1.change.as_ref().unwrap();
    assert_eq!(change.change, vec![0.0, 3.5]);
    assert_eq!(change.rows, vec![0, 2]);
    assert!(t1.stats.as_ref().unwrap().headline().starts_with("Net: 3.5m"));

    let t2 = model.transects[1].change.as_ref().unwrap();
    assert_eq!(t2.erosion, vec![0.0, -2.0, -3.0]);
    assert!(!t2.has_accretion());

    assert!(model.hover_text(change, 1).starts_with("Date: 2021-02-11"));
    assert_eq!(model.statistics.display_rows()[1][0], "T2");
}

#[test]
fn rows_without_year_or_date_are_skipped_per_transect() {
    let tree = DataTree::new("undated");
    let dir = "CoastSat/CATALANGA/Column1Graph";
    tree.write(
        &format!("{dir}/time_series_data.csv"),
        "dates,year,T1_distance_m\n\
         ,2018,20.0\n\
         2019-02-11,2019,10.0\n\
         ,,11.0\n\
         2021-02-11,2021,8.0\n",
    );
    tree.write(
        &format!("{dir}/transect_statistics.csv"),
        "Transect,Mean_Change_m,Std_Dev_m,Max_Erosion_m,Max_Accretion_m,Net_Change_m,Rate_m_per_year,N_Points\n\
         T1,-1.0,1.41,-2.0,0.0,-2.0,-1.0,2\n",
    );
    let mut cache = LayerCache::new();
    let method = &tree.config.analysis_methods[0];

    let model = analysis_model(
        &tree.config,
        &mut cache,
        method.method_dir.as_deref().unwrap(),
        method.time_axis,
    )
    .unwrap();

    let change = model.transects[0].change.as_ref().unwrap();
    assert_eq!(change.baseline, Some(10.0));
    assert_eq!(change.rows, vec![1, 3]);
    assert_eq!(change.change, vec![0.0, -2.0]);
    assert!(change.times[0] < change.times[1]);
}

#[test]
fn regression_skips_rows_without_year() {
    let tree = DataTree::new("regression-undated");
    tree.write(
        "Prediction/Pre2/CATALANGA/transect_timeseries_predicted.csv",
        "year,T1_distance_m\n2025,0.0\n,7.0\n2026,-1.0\n2027,-2.0\n",
    );
    let mut cache = LayerCache::new();

    let model = regression_model(&tree.config, &mut cache).unwrap();
    let t1 = &model.transects[0];
    assert_eq!(t1.years, vec![2025.0, 2026.0, 2027.0]);
    assert_eq!(t1.values, vec![0.0, -1.0, -2.0]);
    assert!((t1.fit.unwrap().slope + 1.0).abs() < 1e-9);
}

#[test]
fn statistics_without_rate_column_name_the_column() {
    let tree = DataTree::new("stats-schema");
    let dir = "Microsoft/CATALANGA/Column1Graph";
    tree.write(&format!("{dir}/time_series_data.csv"), "year,T1_distance_m\n2019,1.0\n");
    tree.write(
        &format!("{dir}/transect_statistics.csv"),
        "Transect,Mean_Change_m,Std_Dev_m,Max_Erosion_m,Max_Accretion_m,Net_Change_m,N_Points\nT1,0,0,0,0,0,1\n",
    );
    let mut cache = LayerCache::new();

    let err = analysis_model(&tree.config, &mut cache, "Microsoft", tree.config.analysis_methods[1].time_axis)
        .unwrap_err();
    assert!(err.to_string().contains("Rate_m_per_year"), "{err}");
}

fn write_scenario_shorelines(tree: &DataTree, scenario_dir: &str) {
    let dir = format!("Prediction/Pre1/CATALANGA/{scenario_dir}");
    let shoreline = |lat: f64, year: i32| {
        line_feature(
            &format!("[[121.0,{lat}],[121.0,{}]]", lat + 0.01),
            &format!(r#"{{"year":{year}}}"#),
        )
    };
    tree.write(
        &format!("{dir}/shorelines_2019_2024.geojson"),
        &collection(&[shoreline(14.0, 2019), shoreline(14.0001, 2024)]),
    );
    tree.write(
        &format!("{dir}/shorelines_2025_2100.geojson"),
        &collection(&[shoreline(14.0002, 2025), shoreline(14.0012, 2100)]),
    );
}

#[test]
fn bruun_prediction_per_scenario() {
    let tree = DataTree::new("bruun");
    let scenario = &tree.config.slr_scenarios[0];
    write_scenario_shorelines(&tree, &scenario.dir);
    let mut cache = LayerCache::new();

    let analysis = bruun_analysis(&tree.config, &mut cache, scenario).unwrap();
    assert_eq!(analysis.historical.len(), 2);
    assert_eq!(analysis.predicted.len(), 2);
    assert_eq!(analysis.prediction_start(), Some(2024));
    assert!((analysis.historical[1].change_m - 11.1).abs() < 1e-6);
    assert!(analysis.historical_rate > 0.0);
    assert!(analysis.historical[0].length_m > 1000.0);
    // 2.22 m/yr historically, 1.48 m/yr predicted.
    assert!(analysis.predicted_rate < analysis.historical_rate);
    assert_eq!(analysis.trend, RateTrend::Decelerating);

    // Other scenarios have their own folder.
    let err = bruun_analysis(&tree.config, &mut cache, &tree.config.slr_scenarios[1]).unwrap_err();
    let PanelError::MissingInput(report) = err else {
        panic!("expected a missing-input report");
    };
    assert_eq!(report.missing().count(), 2);
}

#[test]
fn regression_without_statistics_still_fits_trends() {
    let tree = DataTree::new("regression");
    tree.write(
        "Prediction/Pre2/CATALANGA/transect_timeseries_predicted.csv",
        "year,T1_distance_m,T2_distance_m\n2025,0.0,0.0\n2026,-1.0,0.5\n2027,-2.0,1.0\n2028,-3.0,\n",
    );
    let mut cache = LayerCache::new();

    let model = regression_model(&tree.config, &mut cache).unwrap();
    assert_eq!(model.projection_year, 2030);

    let t1 = &model.transects[0];
    assert!(t1.stats.is_none());
    let fit = t1.fit.unwrap();
    assert!((fit.slope + 1.0).abs() < 1e-9);
    assert_eq!(fit.trend(), SlopeTrend::Erosion);
    assert!((t1.projected_change(2030).unwrap() + 5.0).abs() < 1e-9);
    assert_eq!(t1.erosion, vec![0.0, -1.0, -2.0, -3.0]);

    let t2 = &model.transects[1];
    assert_eq!(t2.years, vec![2025.0, 2026.0, 2027.0]);
    assert_eq!(t2.fit.unwrap().trend(), SlopeTrend::Accretion);
}

#[test]
fn reload_after_files_appear() {
    let tree = DataTree::new("appear");
    let mut state = shorecast::state::AppState::new(tree.config.clone());
    assert!(state.map(0).unwrap().is_err());

    write_coastsat_map(&tree);
    assert!(state.map(0).unwrap().is_err(), "memoized until reload");
    state.reload();
    assert!(state.map(0).unwrap().is_ok());
}
