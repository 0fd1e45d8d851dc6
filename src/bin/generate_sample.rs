//! Writes a synthetic SHORECAST data tree so the dashboard can be tried
//! without field data:
//!
//! ```text
//! cargo run --bin generate_sample -- data
//! SHORECAST_DATA_DIR=data cargo run
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use parquet::arrow::ArrowWriter;
use serde_json::json;
use shorecast::config::DashboardConfig;
use shorecast::data::crs::Crs;

const METRES_PER_DEGREE: f64 = 111_000.0;
/// Shoreline vertices; transects cross every other one.
const N_VERTICES: usize = 11;
const TRANSECT_VERTICES: [usize; 5] = [1, 3, 5, 7, 9];
const TRANSECT_HALF_LENGTH_M: f64 = 150.0;
const FIRST_YEAR: i32 = 2019;
const LAST_YEAR: i32 = 2024;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Synthetic coast
// ---------------------------------------------------------------------------

/// A straight coast running NNE; offsets are metres seaward along its normal.
struct Coast {
    origin: Coord<f64>,
    step: Coord<f64>,
    normal: Coord<f64>,
}

impl Coast {
    fn new() -> Self {
        let step = Coord::<f64> { x: 0.004, y: 0.006 };
        let len = step.x.hypot(step.y);
        Coast {
            origin: Coord { x: 121.000, y: 14.000 },
            step,
            normal: Coord { x: step.y / len, y: -step.x / len },
        }
    }

    fn at(&self, vertex: usize, offset_m: f64) -> Coord<f64> {
        let d = offset_m / METRES_PER_DEGREE;
        Coord {
            x: self.origin.x + self.step.x * vertex as f64 + self.normal.x * d,
            y: self.origin.y + self.step.y * vertex as f64 + self.normal.y * d,
        }
    }

    fn shoreline(&self, offsets: &[f64]) -> Vec<Coord<f64>> {
        offsets.iter().enumerate().map(|(i, &o)| self.at(i, o)).collect()
    }
}

/// Per-year shoreline offsets (metres) for every vertex.
struct History {
    years: Vec<i32>,
    offsets: Vec<Vec<f64>>,
}

impl History {
    fn simulate(rng: &mut SimpleRng, years: impl IntoIterator<Item = i32>, noise_m: f64) -> Self {
        let drift: Vec<f64> = (0..N_VERTICES).map(|_| rng.gauss(-0.5, 2.0)).collect();
        let years: Vec<i32> = years.into_iter().collect();
        let offsets = years
            .iter()
            .map(|&y| {
                drift
                    .iter()
                    .map(|d| d * f64::from(y - FIRST_YEAR) + rng.gauss(0.0, noise_m))
                    .collect()
            })
            .collect();
        History { years, offsets }
    }

    /// Same history pushed landward by `recession_m` per year after `from`.
    fn receded(&self, from: i32, recession_m: f64) -> Self {
        let offsets = self
            .years
            .iter()
            .zip(&self.offsets)
            .map(|(&y, row)| {
                let shift = recession_m * f64::from((y - from).max(0));
                row.iter().map(|o| o - shift).collect()
            })
            .collect();
        History {
            years: self.years.clone(),
            offsets,
        }
    }
}

// ---------------------------------------------------------------------------
// GeoJSON writing
// ---------------------------------------------------------------------------

fn props(pairs: &[(&str, JsonValue)]) -> JsonObject {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn position(c: Coord<f64>, crs: Option<Crs>) -> Vec<f64> {
    let c = crs.map_or(c, |crs| crs.from_wgs84(c));
    vec![c.x, c.y]
}

fn feature(value: Option<Value>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: value.map(Geometry::new),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn line(coords: &[Coord<f64>], crs: Option<Crs>) -> Value {
    Value::LineString(coords.iter().map(|&c| position(c, crs)).collect())
}

fn write_geojson(path: &Path, features: Vec<Feature>, crs: Option<Crs>) -> Result<()> {
    let foreign_members = crs.map(|crs| {
        props(&[(
            "crs",
            json!({ "type": "name", "properties": { "name": crs.to_string() } }),
        )])
    });
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    };
    let text = serde_json::to_string(&collection)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn shoreline_features(coast: &Coast, history: &History, crs: Option<Crs>) -> Vec<Feature> {
    let mut features: Vec<Feature> = history
        .years
        .iter()
        .zip(&history.offsets)
        .map(|(&year, row)| {
            feature(
                Some(line(&coast.shoreline(row), crs)),
                props(&[("year", json!(year)), ("satname", json!("L8"))]),
            )
        })
        .collect();
    // Cloud-masked acquisition with no usable shoreline.
    features.push(feature(None, props(&[("year", json!(LAST_YEAR))])));
    features
}

fn transect_features(coast: &Coast, crs: Option<Crs>) -> Vec<Feature> {
    TRANSECT_VERTICES
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let ends = [coast.at(v, -TRANSECT_HALF_LENGTH_M), coast.at(v, TRANSECT_HALF_LENGTH_M)];
            feature(Some(line(&ends, crs)), props(&[("name", json!(format!("T{}", i + 1)))]))
        })
        .collect()
}

fn intersection_features(coast: &Coast, history: &History, crs: Option<Crs>) -> Vec<Feature> {
    let mut features = Vec::new();
    for (&year, row) in history.years.iter().zip(&history.offsets).skip(1) {
        for (i, &v) in TRANSECT_VERTICES.iter().enumerate() {
            let change = row[v] - history.offsets[0][v];
            features.push(feature(
                Some(Value::Point(position(coast.at(v, row[v]), crs))),
                props(&[
                    ("transect", json!(format!("T{}", i + 1))),
                    ("start_year", json!(FIRST_YEAR)),
                    ("end_year", json!(year)),
                    ("change_m", json!((change * 100.0).round() / 100.0)),
                ]),
            ));
        }
    }
    features
}

/// Area between the first shoreline and each later one.
fn change_polygon_features(coast: &Coast, history: &History, crs: Option<Crs>) -> Vec<Feature> {
    let base = coast.shoreline(&history.offsets[0]);
    history
        .years
        .iter()
        .zip(&history.offsets)
        .skip(1)
        .map(|(&year, row)| {
            let mut ring: Vec<Vec<f64>> = base.iter().map(|&c| position(c, crs)).collect();
            ring.extend(coast.shoreline(row).iter().rev().map(|&c| position(c, crs)));
            ring.push(position(base[0], crs));
            let net: f64 = row.iter().zip(&history.offsets[0]).map(|(a, b)| a - b).sum::<f64>() / row.len() as f64;
            feature(
                Some(Value::Polygon(vec![ring])),
                props(&[
                    ("start_year", json!(FIRST_YEAR)),
                    ("end_year", json!(year)),
                    ("type", json!(if net >= 0.0 { "accretion" } else { "erosion" })),
                ]),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One time-series row: acquisition time plus the distance along every
/// transect (None when the shoreline did not cross it).
struct SeriesRow {
    date: Option<String>,
    year: i32,
    time: f64,
    distances: Vec<Option<f64>>,
}

fn transect_names() -> Vec<String> {
    (1..=TRANSECT_VERTICES.len()).map(|i| format!("T{i}")).collect()
}

/// Several acquisitions per year, interpolated from the yearly shorelines.
fn satellite_series(rng: &mut SimpleRng, history: &History) -> Vec<SeriesRow> {
    let mut rows = Vec::new();
    for (&year, row) in history.years.iter().zip(&history.offsets) {
        for (month, day) in [(2, 11), (6, 3), (10, 27)] {
            let distances = TRANSECT_VERTICES
                .iter()
                .map(|&v| {
                    (rng.next_f64() > 0.06).then(|| TRANSECT_HALF_LENGTH_M + row[v] + rng.gauss(0.0, 1.5))
                })
                .collect();
            rows.push(SeriesRow {
                date: Some(format!("{year}-{month:02}-{day:02} 02:{:02}:00+00:00", 10 + month)),
                year,
                time: f64::from(year) + f64::from(month - 1) / 12.0,
                distances,
            });
        }
    }
    rows
}

fn yearly_series(history: &History) -> Vec<SeriesRow> {
    history
        .years
        .iter()
        .zip(&history.offsets)
        .map(|(&year, row)| SeriesRow {
            date: None,
            year,
            time: f64::from(year),
            distances: TRANSECT_VERTICES
                .iter()
                .map(|&v| Some(TRANSECT_HALF_LENGTH_M + row[v]))
                .collect(),
        })
        .collect()
}

fn write_series_csv(path: &Path, rows: &[SeriesRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    let with_dates = rows.iter().any(|r| r.date.is_some());
    let mut header = Vec::new();
    if with_dates {
        header.push("dates".to_string());
    }
    header.push("year".to_string());
    header.extend(transect_names().iter().map(|t| format!("{t}_distance_m")));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = Vec::new();
        if with_dates {
            record.push(row.date.clone().unwrap_or_default());
        }
        record.push(row.year.to_string());
        record.extend(row.distances.iter().map(|d| d.map(|d| format!("{d:.3}")).unwrap_or_default()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_series_parquet(path: &Path, rows: &[SeriesRow]) -> Result<()> {
    let mut fields = vec![Field::new("year", DataType::Int64, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int64Array::from(
        rows.iter().map(|r| i64::from(r.year)).collect::<Vec<_>>(),
    ))];
    for (k, name) in transect_names().iter().enumerate() {
        fields.push(Field::new(format!("{name}_distance_m"), DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.distances[k]).collect::<Vec<_>>(),
        )));
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Least-squares slope of `ys` over `xs`.
fn slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx > 0.0 { sxy / sxx } else { 0.0 }
}

fn write_statistics_csv(path: &Path, rows: &[SeriesRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Transect",
        "Mean_Change_m",
        "Std_Dev_m",
        "Max_Erosion_m",
        "Max_Accretion_m",
        "Net_Change_m",
        "Rate_m_per_year",
        "N_Points",
    ])?;

    for (k, name) in transect_names().iter().enumerate() {
        let (times, values): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .filter_map(|r| r.distances[k].map(|d| (r.time, d)))
            .unzip();
        let Some(&base) = values.first() else {
            continue;
        };
        let change: Vec<f64> = values.iter().map(|v| v - base).collect();
        let n = change.len() as f64;
        let mean = change.iter().sum::<f64>() / n;
        let std = (change.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0)).sqrt();
        let min = change.iter().copied().fold(f64::INFINITY, f64::min);
        let max = change.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let net = change.last().copied().unwrap_or(0.0);
        writer.write_record(&[
            name.clone(),
            format!("{mean:.4}"),
            format!("{std:.4}"),
            format!("{min:.4}"),
            format!("{max:.4}"),
            format!("{net:.4}"),
            format!("{:.4}", slope(&times, &change)),
            change.len().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Data tree
// ---------------------------------------------------------------------------

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

/// `<method>/<site>/` map layers plus `Column1Graph/` tables.
fn write_satellite_method(
    root: &Path,
    site: &str,
    method: &str,
    rng: &mut SimpleRng,
    crs: Option<Crs>,
) -> Result<()> {
    let coast = Coast::new();
    let history = History::simulate(rng, FIRST_YEAR..=LAST_YEAR, 3.0);
    let dir = root.join(method).join(site);
    create_dir(&dir)?;

    write_geojson(&dir.join(format!("{site}_transects.geojson")), transect_features(&coast, crs), crs)?;
    write_geojson(
        &dir.join(format!("{site}_shorelines.geojson")),
        shoreline_features(&coast, &history, crs),
        crs,
    )?;
    write_geojson(
        &dir.join(format!("{site}_intersections.geojson")),
        intersection_features(&coast, &history, crs),
        crs,
    )?;
    write_geojson(
        &dir.join(format!("{site}_change_polygons.geojson")),
        change_polygon_features(&coast, &history, crs),
        crs,
    )?;

    let graphs = dir.join("Column1Graph");
    create_dir(&graphs)?;
    let rows = satellite_series(rng, &history);
    write_series_csv(&graphs.join("time_series_data.csv"), &rows)?;
    write_statistics_csv(&graphs.join("transect_statistics.csv"), &rows)?;
    log::info!("{method}: {} shorelines, {} series rows", history.years.len(), rows.len());
    Ok(())
}

fn write_curve_fitting(root: &Path, site: &str, rng: &mut SimpleRng) -> Result<()> {
    let coast = Coast::new();
    let history = History::simulate(rng, FIRST_YEAR..=LAST_YEAR, 1.0);
    let dir = root.join("Method3").join(site);
    create_dir(&dir)?;
    write_geojson(&dir.join(format!("{site}_transects.geojson")), transect_features(&coast, None), None)?;
    write_geojson(
        &dir.join(format!("{site}_shorelines.geojson")),
        shoreline_features(&coast, &history, None),
        None,
    )?;

    let graphs = dir.join("Column1Graph");
    create_dir(&graphs)?;
    let rows = yearly_series(&history);
    write_series_parquet(&graphs.join("time_series_data.parquet"), &rows)?;
    write_statistics_csv(&graphs.join("transect_statistics.csv"), &rows)?;
    Ok(())
}

/// Scenario maps and Bruun rule predictions, one folder per SLR scenario.
fn write_scenarios(root: &Path, config: &DashboardConfig, rng: &mut SimpleRng) -> Result<()> {
    let site = &config.site;
    let prediction = &config.prediction;
    let coast = Coast::new();
    let historical = History::simulate(rng, FIRST_YEAR..=LAST_YEAR, 1.0);
    let future = History::simulate(rng, (LAST_YEAR + 1..=2100).step_by(5), 0.5);

    for (k, scenario) in config.slr_scenarios.iter().enumerate() {
        // Bruun recession of roughly 50 m per metre of rise, spread to 2100.
        let rise_m = 0.1 * (k + 1) as f64;
        let recession = 50.0 * rise_m / f64::from(2100 - LAST_YEAR);

        let map_dir = root.join("Method4").join(site).join(&scenario.dir);
        create_dir(&map_dir)?;
        let map_history = historical.receded(FIRST_YEAR, recession);
        write_geojson(
            &map_dir.join("shorelines_2019_2024.geojson"),
            shoreline_features(&coast, &map_history, None),
            None,
        )?;

        let pred_dir = root
            .join("Prediction")
            .join(&prediction.bruun_method)
            .join(site)
            .join(&scenario.dir);
        create_dir(&pred_dir)?;
        write_geojson(
            &pred_dir.join(format!("{}.geojson", prediction.historical_file)),
            shoreline_features(&coast, &historical, None),
            None,
        )?;
        write_geojson(
            &pred_dir.join(format!("{}.geojson", prediction.predicted_file)),
            shoreline_features(&coast, &future.receded(LAST_YEAR, recession * 4.0), None),
            None,
        )?;
    }
    Ok(())
}

fn write_regression(root: &Path, config: &DashboardConfig, rng: &mut SimpleRng) -> Result<()> {
    let prediction = &config.prediction;
    let dir = root.join("Prediction").join(&prediction.regression_method).join(&config.site);
    create_dir(&dir)?;

    let slopes: Vec<f64> = TRANSECT_VERTICES.iter().map(|_| rng.gauss(-0.3, 1.2)).collect();
    let rows: Vec<SeriesRow> = (LAST_YEAR + 1..=LAST_YEAR + 11)
        .map(|year| {
            let t = f64::from(year - LAST_YEAR - 1);
            SeriesRow {
                date: None,
                year,
                time: f64::from(year),
                distances: slopes.iter().map(|s| Some(s * t + rng.gauss(0.0, 0.4))).collect(),
            }
        })
        .collect();
    write_series_csv(&dir.join(format!("{}.csv", prediction.timeseries_file)), &rows)?;
    write_statistics_csv(&dir.join(format!("{}.csv", prediction.statistics_file)), &rows)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let config = DashboardConfig::default();
    let mut rng = SimpleRng::new(42);

    write_satellite_method(&root, &config.site, "CoastSat", &mut rng, None)?;
    // Projected metres, declared through the GeoJSON `crs` member.
    write_satellite_method(&root, &config.site, "Microsoft", &mut rng, Some(Crs::from_epsg(32651)?))?;
    write_curve_fitting(&root, &config.site, &mut rng)?;
    write_scenarios(&root, &config, &mut rng)?;
    write_regression(&root, &config, &mut rng)?;

    println!("Wrote sample data for {} to {}", config.site, root.display());
    Ok(())
}
