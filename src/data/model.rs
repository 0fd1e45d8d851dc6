use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use geo::{BoundingRect, Geometry, Rect};

// ---------------------------------------------------------------------------
// AttributeValue – a single cell in a feature property or table column
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value, as found in GeoJSON properties and
/// CSV / Parquet cells.
/// Used as a `BTreeSet` key downstream, so `AttributeValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put AttributeValue in BTreeSet --

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use AttributeValue::*;
        fn discriminant(v: &AttributeValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Null => write!(f, "<null>"),
        }
    }
}

impl AttributeValue {
    /// Interpret the value as an `f64`. Numeric strings are accepted because
    /// CSV exports are not always consistent about quoting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret the value as a calendar year.
    ///
    /// * integers are taken as-is
    /// * finite floats are truncated (`2020.0` → 2020)
    /// * strings yield their leading four-digit year (`"2020-05-01"` → 2020)
    pub fn as_year(&self) -> Option<i32> {
        match self {
            AttributeValue::Integer(i) => i32::try_from(*i).ok(),
            AttributeValue::Float(v) if v.is_finite() => Some(v.trunc() as i32),
            AttributeValue::String(s) => leading_year(s.trim()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

fn leading_year(s: &str) -> Option<i32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// FeatureRecord – one row of a vector layer
// ---------------------------------------------------------------------------

/// A single feature after the null-geometry filter.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    /// Geometry in WGS84 lon/lat.
    pub geometry: Geometry<f64>,
    /// Attribute columns: column_name → value.
    pub properties: BTreeMap<String, AttributeValue>,
}

impl FeatureRecord {
    /// Hover text in the form `"<b>Title</b>\ncol: value\n..."` without the
    /// markup: a title line followed by one `key: value` line per attribute.
    pub fn describe(&self, title: &str) -> String {
        let mut text = String::from(title);
        for (key, value) in &self.properties {
            text.push('\n');
            text.push_str(&format!("{key}: {value}"));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// FeatureLayer – one loaded vector file
// ---------------------------------------------------------------------------

/// A loaded vector file with its attribute schema.
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    pub features: Vec<FeatureRecord>,
    /// Ordered list of attribute columns present on at least one feature.
    pub column_names: BTreeSet<String>,
    /// Number of features dropped because their geometry was null.
    pub dropped_null: usize,
    /// Features skipped because their geometry kind is not drawable
    /// (e.g. a GeometryCollection).
    pub dropped_unsupported: usize,
}

impl FeatureLayer {
    /// Build the column index from the loaded features.
    pub fn from_features(features: Vec<FeatureRecord>, dropped_null: usize) -> Self {
        let column_names = features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        FeatureLayer {
            features,
            column_names,
            dropped_null,
            dropped_unsupported: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Envelope of every geometry in the layer.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(merge_rects)
    }
}

/// Smallest rectangle covering both inputs.
pub fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

// ---------------------------------------------------------------------------
// RawTable – a parsed CSV / Parquet file before schema interpretation
// ---------------------------------------------------------------------------

/// Column-oriented table of attribute values.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// `columns[c][r]` – one vector per header, all of equal length.
    pub columns: Vec<Vec<AttributeValue>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<&[AttributeValue]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}
