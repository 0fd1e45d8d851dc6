use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use geo::{Coord, CoordsIter, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, JsonObject, JsonValue};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::crs::{Crs, is_geographic};
use super::model::{AttributeValue, FeatureLayer, FeatureRecord, RawTable};

// ---------------------------------------------------------------------------
// Vector entry-point
// ---------------------------------------------------------------------------

/// Load a GeoJSON FeatureCollection, drop null geometries and reproject to
/// WGS84.
///
/// The source reference comes from `crs_override` when given, else from the
/// legacy `crs` member of the collection, else WGS84.
pub fn load_vector(path: &Path, crs_override: Option<Crs>) -> Result<FeatureLayer> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let root = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing GeoJSON {}", path.display()))?;

    let (features, foreign) = match root {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(f) => (vec![f], None),
        GeoJson::Geometry(_) => bail!("{}: expected a FeatureCollection, found a bare geometry", path.display()),
    };

    let declared = match foreign.as_ref().and_then(declared_crs_name) {
        Some(name) => Some(Crs::parse(&name).with_context(|| format!("{}: reading 'crs' member", path.display()))?),
        None => None,
    };
    let source_crs = crs_override.or(declared).unwrap_or(Crs::Wgs84);

    let mut records = Vec::with_capacity(features.len());
    let mut dropped_null = 0usize;
    let mut dropped_unsupported = 0usize;

    for (i, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            dropped_null += 1;
            continue;
        };
        let Some(geometry) = convert_geometry(geometry.value) else {
            log::debug!("{}: feature {i} has an unsupported geometry kind, skipped", path.display());
            dropped_unsupported += 1;
            continue;
        };

        if source_crs == Crs::Wgs84 && declared.is_none() && crs_override.is_none() {
            if let Some(c) = geometry.coords_iter().find(|c| !is_geographic(*c)) {
                bail!(
                    "{}: feature {i} has coordinate ({}, {}) outside the lon/lat range; \
                     add a 'crs' member naming the projection",
                    path.display(),
                    c.x,
                    c.y
                );
            }
        }

        let properties = feature
            .properties
            .as_ref()
            .map(properties_to_attributes)
            .unwrap_or_default();

        records.push(FeatureRecord {
            geometry: source_crs.reproject(geometry),
            properties,
        });
    }

    let mut layer = FeatureLayer::from_features(records, dropped_null);
    layer.dropped_unsupported = dropped_unsupported;
    log::info!(
        "Loaded {} features ({} null, {} unsupported dropped) from {} [{}]",
        layer.len(),
        layer.dropped_null,
        layer.dropped_unsupported,
        path.display(),
        source_crs
    );
    Ok(layer)
}

/// `{"crs": {"type": "name", "properties": {"name": "EPSG:32651"}}}`
fn declared_crs_name(foreign: &JsonObject) -> Option<String> {
    let crs = foreign.get("crs")?;
    crs.get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

fn properties_to_attributes(props: &JsonObject) -> BTreeMap<String, AttributeValue> {
    props
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect()
}

fn json_to_attribute(val: &JsonValue) -> AttributeValue {
    match val {
        JsonValue::String(s) => AttributeValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                AttributeValue::Float(f)
            } else {
                AttributeValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => AttributeValue::Bool(*b),
        JsonValue::Null => AttributeValue::Null,
        other => AttributeValue::String(other.to_string()),
    }
}

// -- GeoJSON → geo --

fn to_coord(pos: &[f64]) -> Coord<f64> {
    Coord {
        x: pos.first().copied().unwrap_or(f64::NAN),
        y: pos.get(1).copied().unwrap_or(f64::NAN),
    }
}

fn to_line(positions: &[Vec<f64>]) -> LineString<f64> {
    positions.iter().map(|p| to_coord(p)).collect()
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|r| to_line(r));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn convert_geometry(value: geojson::Value) -> Option<Geometry<f64>> {
    use geojson::Value;
    let geometry = match value {
        Value::Point(p) => Geometry::Point(Point(to_coord(&p))),
        Value::MultiPoint(ps) => {
            Geometry::MultiPoint(MultiPoint(ps.iter().map(|p| Point(to_coord(p))).collect()))
        }
        Value::LineString(ls) => Geometry::LineString(to_line(&ls)),
        Value::MultiLineString(mls) => {
            Geometry::MultiLineString(MultiLineString(mls.iter().map(|l| to_line(l)).collect()))
        }
        Value::Polygon(rings) => Geometry::Polygon(to_polygon(&rings)),
        Value::MultiPolygon(polys) => {
            Geometry::MultiPolygon(MultiPolygon(polys.iter().map(|p| to_polygon(p)).collect()))
        }
        Value::GeometryCollection(_) => return None,
    };
    Some(geometry)
}

// ---------------------------------------------------------------------------
// Table entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one value per cell (empty cell → Null)
/// * `.parquet` – flat columns of strings, ints, floats or bools
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported table extension: .{other}"),
    };
    log::info!(
        "Loaded table {} ({} rows, columns {:?})",
        path.display(),
        table.n_rows(),
        table.headers
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut columns: Vec<Vec<AttributeValue>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{}: CSV row {row_no}", path.display()))?;
        if record.len() != headers.len() {
            bail!(
                "{}: CSV row {row_no} has {} fields but the header has {}",
                path.display(),
                record.len(),
                headers.len()
            );
        }
        for (col, value) in columns.iter_mut().zip(record.iter()) {
            col.push(guess_attribute_type(value.trim()));
        }
    }

    Ok(RawTable { headers, columns })
}

fn guess_attribute_type(s: &str) -> AttributeValue {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return AttributeValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return AttributeValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return AttributeValue::Float(f);
    }
    if s == "true" || s == "false" || s == "True" || s == "False" {
        return AttributeValue::Bool(s.eq_ignore_ascii_case("true"));
    }
    AttributeValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<AttributeValue>> = vec![Vec::new(); headers.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                column.push(extract_attribute_value(array, row));
            }
        }
    }

    Ok(RawTable { headers, columns })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_attribute_value(col: &Arc<dyn Array>, row: usize) -> AttributeValue {
    if col.is_null(row) {
        return AttributeValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(s) => AttributeValue::String(s.value(row).to_string()),
            None => AttributeValue::Null,
        },
        DataType::LargeUtf8 => AttributeValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(AttributeValue::Null, |a| AttributeValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(AttributeValue::Null, |a| AttributeValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(AttributeValue::Null, |a| float_cell(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(AttributeValue::Null, |a| float_cell(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(AttributeValue::Null, |a| AttributeValue::Bool(a.value(row))),
        other => AttributeValue::String(format!("{other:?}")),
    }
}

/// Pandas writes missing floats as NaN rather than null.
fn float_cell(v: f64) -> AttributeValue {
    if v.is_nan() {
        AttributeValue::Null
    } else {
        AttributeValue::Float(v)
    }
}
