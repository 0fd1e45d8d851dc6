//! Shoreline prediction analysis.
//!
//! Two independent models feed the prediction panels:
//! * Bruun rule: per-year shoreline metrics (geodesic length, mean centroid
//!   latitude) for a historical and a predicted layer, turned into a
//!   position change against the first historical year.
//! * Regression: a least-squares line through one transect's predicted
//!   positions.

use geo::{Centroid, Geometry, HaversineLength};

use super::filter::{bucket_by_year, probe_field};
use super::model::FeatureLayer;
use crate::error::{PanelError, PanelResult};

/// Metres per degree of latitude, the conversion used for position change.
pub const METRES_PER_DEGREE: f64 = 111_000.0;

// ---------------------------------------------------------------------------
// Bruun rule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearMetric {
    pub year: i32,
    /// Summed geodesic length of the year's shorelines (m).
    pub length_m: f64,
    /// Mean latitude of the year's shoreline centroids.
    pub mean_latitude: f64,
    /// Position change relative to the baseline latitude (m).
    pub change_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTrend {
    Accelerating,
    Decelerating,
    Stable,
}

impl RateTrend {
    pub fn classify(historical_rate: f64, predicted_rate: f64) -> Self {
        if predicted_rate > historical_rate {
            RateTrend::Accelerating
        } else if predicted_rate < historical_rate {
            RateTrend::Decelerating
        } else {
            RateTrend::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateTrend::Accelerating => "⬆ Accelerating Change",
            RateTrend::Decelerating => "⬇ Decelerating Change",
            RateTrend::Stable => "➡ Stable Trend",
        }
    }
}

/// Everything the Bruun-rule panel shows.
#[derive(Debug, Clone)]
pub struct BruunAnalysis {
    pub historical: Vec<YearMetric>,
    pub predicted: Vec<YearMetric>,
    pub historical_rate: f64,
    pub predicted_rate: f64,
    pub trend: RateTrend,
}

impl BruunAnalysis {
    /// Build the analysis from the two shoreline layers of one scenario.
    ///
    /// `source_names` label the layers in schema errors.
    pub fn from_layers(
        historical: &FeatureLayer,
        predicted: &FeatureLayer,
        year_fields: &[impl AsRef<str>],
        source_names: [&str; 2],
    ) -> PanelResult<Self> {
        let mut hist = year_metrics(historical, year_fields, source_names[0])?;
        let mut pred = year_metrics(predicted, year_fields, source_names[1])?;

        if let Some(baseline) = hist.first().map(|m| m.mean_latitude) {
            for m in hist.iter_mut().chain(pred.iter_mut()) {
                m.change_m = (m.mean_latitude - baseline) * METRES_PER_DEGREE;
            }
        }

        let historical_rate = period_rate(&hist);
        let predicted_rate = period_rate(&pred);
        Ok(BruunAnalysis {
            historical: hist,
            predicted: pred,
            historical_rate,
            predicted_rate,
            trend: RateTrend::classify(historical_rate, predicted_rate),
        })
    }

    /// Historical then predicted change, for the cumulative projection.
    pub fn combined(&self) -> impl Iterator<Item = &YearMetric> {
        self.historical.iter().chain(&self.predicted)
    }

    /// Year the prediction starts from (the last historical year).
    pub fn prediction_start(&self) -> Option<i32> {
        self.historical.last().map(|m| m.year)
    }

    /// Change accumulated over the predicted period.
    pub fn predicted_period_change(&self) -> Option<f64> {
        match (self.predicted.first(), self.predicted.last()) {
            (Some(first), Some(last)) => Some(last.change_m - first.change_m),
            _ => None,
        }
    }
}

/// Per-year length and mean centroid latitude, ascending by year. Years whose
/// features have no centroid (empty geometries) are left out. `change_m` is
/// left at 0 for the caller to fill.
pub fn year_metrics(
    layer: &FeatureLayer,
    year_fields: &[impl AsRef<str>],
    source_name: &str,
) -> PanelResult<Vec<YearMetric>> {
    let field = probe_field(&layer.column_names, year_fields)
        .found()
        .ok_or_else(|| PanelError::schema_field("year field", source_name, year_fields))?;

    let metrics = bucket_by_year(layer, field)
        .into_iter()
        .filter_map(|(year, rows)| {
            let geometries: Vec<&Geometry<f64>> = rows.iter().map(|&r| &layer.features[r].geometry).collect();
            let latitudes: Vec<f64> = geometries.iter().filter_map(|g| g.centroid()).map(|c| c.y()).collect();
            if latitudes.is_empty() {
                return None;
            }
            Some(YearMetric {
                year,
                length_m: geometries.iter().map(|g| geodesic_length(g)).sum(),
                mean_latitude: latitudes.iter().sum::<f64>() / latitudes.len() as f64,
                change_m: 0.0,
            })
        })
        .collect();
    Ok(metrics)
}

/// Haversine length of the linear parts of a geometry; points and polygons
/// contribute their boundary length or nothing.
fn geodesic_length(geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::LineString(line) => line.haversine_length(),
        Geometry::MultiLineString(lines) => lines.haversine_length(),
        Geometry::Polygon(poly) => poly.exterior().haversine_length(),
        Geometry::MultiPolygon(polys) => polys.iter().map(|p| p.exterior().haversine_length()).sum(),
        _ => 0.0,
    }
}

/// `(last change − first change) / (last year − first year)`, 0 with fewer
/// than two years.
pub fn period_rate(metrics: &[YearMetric]) -> f64 {
    match (metrics.first(), metrics.last()) {
        (Some(first), Some(last)) if last.year != first.year => {
            (last.change_m - first.change_m) / f64::from(last.year - first.year)
        }
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeTrend {
    Accretion,
    Erosion,
    Stable,
}

impl SlopeTrend {
    pub fn label(self) -> &'static str {
        match self {
            SlopeTrend::Accretion => "⬆ Accretion (Positive Trend)",
            SlopeTrend::Erosion => "⬇ Erosion (Negative Trend)",
            SlopeTrend::Stable => "➡ Stable",
        }
    }
}

impl LinearTrend {
    /// Ordinary least squares over `(x, y)`. `None` with fewer than two
    /// points or when every `x` is equal.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let nf = n as f64;
        let sum_x: f64 = xs.iter().sum();
        let sum_y: f64 = ys.iter().sum();
        let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
        let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

        let denom = nf * sum_xx - sum_x * sum_x;
        if denom.abs() <= f64::EPSILON * nf * sum_xx.abs().max(1.0) {
            return None;
        }
        let slope = (nf * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / nf;
        Some(LinearTrend { slope, intercept })
    }

    pub fn trend(&self) -> SlopeTrend {
        if self.slope > 0.0 {
            SlopeTrend::Accretion
        } else if self.slope < 0.0 {
            SlopeTrend::Erosion
        } else {
            SlopeTrend::Stable
        }
    }

    /// Change accumulated from `first_year` to `target_year` at this slope.
    pub fn projected_change(&self, first_year: f64, target_year: i32) -> f64 {
        self.slope * (f64::from(target_year) - first_year)
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AttributeValue, FeatureRecord};
    use geo::{Geometry, line_string};
    use std::collections::BTreeMap;

    fn shoreline(year: i64, lat: f64) -> FeatureRecord {
        FeatureRecord {
            geometry: Geometry::LineString(line_string![(x: 121.0, y: lat), (x: 121.01, y: lat)]),
            properties: BTreeMap::from([("year".to_string(), AttributeValue::Integer(year))]),
        }
    }

    fn layer(rows: &[(i64, f64)]) -> FeatureLayer {
        FeatureLayer::from_features(rows.iter().map(|&(y, lat)| shoreline(y, lat)).collect(), 0)
    }

    #[test]
    fn bruun_change_is_relative_to_first_historical_year() {
        let hist = layer(&[(2019, 13.0), (2024, 13.0001)]);
        let pred = layer(&[(2025, 13.0002), (2100, 13.0010)]);
        let analysis = BruunAnalysis::from_layers(&hist, &pred, &["year", "Year"], ["hist", "pred"]).unwrap();

        assert_eq!(analysis.historical[0].change_m, 0.0);
        assert!((analysis.historical[1].change_m - 11.1).abs() < 1e-6);
        assert!((analysis.predicted[1].change_m - 111.0).abs() < 1e-6);

        assert!((analysis.historical_rate - 11.1 / 5.0).abs() < 1e-6);
        assert!((analysis.predicted_rate - 88.8 / 75.0).abs() < 1e-6);
        assert_eq!(analysis.trend, RateTrend::Decelerating);
        assert_eq!(analysis.prediction_start(), Some(2024));
        assert_eq!(analysis.combined().count(), 4);
    }

    #[test]
    fn length_is_geodesic_metres() {
        let hist = layer(&[(2019, 0.0)]);
        let metrics = year_metrics(&hist, &["year"], "hist").unwrap();
        // 0.01° of longitude at the equator
        assert!((metrics[0].length_m - 1111.95).abs() < 1.0);
    }

    #[test]
    fn single_year_rate_is_zero() {
        let metrics = [YearMetric { year: 2019, length_m: 1.0, mean_latitude: 0.0, change_m: 3.0 }];
        assert_eq!(period_rate(&metrics), 0.0);
        assert_eq!(period_rate(&[]), 0.0);
        assert_eq!(RateTrend::classify(0.0, 0.0), RateTrend::Stable);
        assert_eq!(RateTrend::classify(0.0, 0.5), RateTrend::Accelerating);
    }

    #[test]
    fn missing_year_field_is_schema_error() {
        let hist = layer(&[(2019, 0.0)]);
        let err = year_metrics(&hist, &["Year", "YEAR"], "shorelines_2019_2024").unwrap_err();
        assert!(matches!(err, PanelError::SchemaField { .. }));
    }

    #[test]
    fn least_squares_line() {
        let xs = [2025.0, 2026.0, 2027.0, 2028.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit = LinearTrend::fit(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.at(2025.0) - 1.0).abs() < 1e-6);
        assert_eq!(fit.trend(), SlopeTrend::Accretion);
        assert!((fit.projected_change(2025.0, 2030) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_fits() {
        assert!(LinearTrend::fit(&[2025.0], &[1.0]).is_none());
        assert!(LinearTrend::fit(&[2025.0, 2025.0, 2025.0], &[1.0, 2.0, 3.0]).is_none());
        let flat = LinearTrend::fit(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(flat.trend(), SlopeTrend::Stable);
    }
}
