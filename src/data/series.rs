//! Per-transect time series: table schema and cumulative change.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{AttributeValue, RawTable};
use crate::config::TimeAxis;
use crate::error::{PanelError, PanelResult};

pub const DISTANCE_SUFFIX: &str = "_distance_m";
pub const YEAR_COLUMN: &str = "year";
pub const DATES_COLUMN: &str = "dates";

// ---------------------------------------------------------------------------
// TimeSeriesTable
// ---------------------------------------------------------------------------

/// One transect's raw distance column.
#[derive(Debug, Clone)]
pub struct TransectColumn {
    /// Transect name, i.e. the header without `_distance_m`.
    pub name: String,
    pub distances: Vec<Option<f64>>,
}

/// A parsed `time_series_data` table.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    /// `None` where the row has no usable year.
    pub years: Vec<Option<i32>>,
    /// Parsed `dates` column, when the table has one.
    pub dates: Option<Vec<Option<NaiveDateTime>>>,
    pub transects: Vec<TransectColumn>,
}

impl TimeSeriesTable {
    pub fn from_raw(table: &RawTable, source_name: &str) -> PanelResult<Self> {
        let year_col = table
            .column(YEAR_COLUMN)
            .ok_or_else(|| PanelError::schema_field("year column", source_name, &[YEAR_COLUMN]))?;

        let years: Vec<Option<i32>> = year_col
            .iter()
            .map(|v| v.as_f64().filter(|y| y.is_finite()).map(|y| y.round() as i32))
            .collect();
        let undated = years.iter().filter(|y| y.is_none()).count();
        if undated > 0 {
            log::debug!("{source_name}: {undated} rows without a year are left out of every series");
        }

        let dates = table
            .column(DATES_COLUMN)
            .map(|col| col.iter().map(parse_date).collect());

        let transects = table
            .headers
            .iter()
            .zip(&table.columns)
            .filter_map(|(header, values)| {
                let name = header.strip_suffix(DISTANCE_SUFFIX)?;
                Some(TransectColumn {
                    name: name.to_string(),
                    distances: values.iter().map(|v| v.as_f64().filter(|d| !d.is_nan())).collect(),
                })
            })
            .collect();

        Ok(TimeSeriesTable { years, dates, transects })
    }

    /// Time coordinate of every row on the requested axis. A row needs a
    /// year, and on the date axis also a parsable date; otherwise it is `None`.
    pub fn times(&self, axis: TimeAxis) -> Vec<Option<f64>> {
        match (axis, &self.dates) {
            (TimeAxis::Dates, Some(dates)) => self
                .years
                .iter()
                .zip(dates)
                .map(|(year, date)| year.and(date.as_ref()).map(decimal_year))
                .collect(),
            _ => self.years.iter().map(|y| y.map(f64::from)).collect(),
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` with or without an offset, and
/// plain `YYYY-MM-DD`.
pub fn parse_date(value: &AttributeValue) -> Option<NaiveDateTime> {
    let AttributeValue::String(s) = value else {
        return None;
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2020-07-02` → ~2020.5
pub fn decimal_year(dt: &NaiveDateTime) -> f64 {
    let year = dt.year();
    let start = NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    match (start, end) {
        (Some(start), Some(end)) => {
            let elapsed = (*dt - start).num_seconds() as f64;
            let total = (end - start).num_seconds() as f64;
            f64::from(year) + elapsed / total
        }
        _ => f64::from(year),
    }
}

// ---------------------------------------------------------------------------
// Cumulative change
// ---------------------------------------------------------------------------

/// The timestamp and distance columns of one transect disagree in length.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{times} timestamps but {values} distance values")]
pub struct SeriesLengthMismatch {
    pub times: usize,
    pub values: usize,
}

/// Baseline-relative change of one transect plus its accretion / erosion
/// decomposition. All vectors are aligned by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CumulativeChange {
    /// First distance remaining after missing values are excluded.
    pub baseline: Option<f64>,
    pub times: Vec<f64>,
    /// Source row of each retained point (for hover lookups).
    pub rows: Vec<usize>,
    pub distances: Vec<f64>,
    pub change: Vec<f64>,
    /// `change` where strictly positive, else 0.
    pub accretion: Vec<f64>,
    /// `change` where strictly negative (kept negative), else 0.
    pub erosion: Vec<f64>,
}

impl CumulativeChange {
    pub fn is_empty(&self) -> bool {
        self.change.is_empty()
    }

    pub fn has_accretion(&self) -> bool {
        self.accretion.iter().any(|&v| v > 0.0)
    }

    pub fn has_erosion(&self) -> bool {
        self.erosion.iter().any(|&v| v < 0.0)
    }
}

/// Drop rows missing a time or a distance, subtract the first remaining
/// distance and split the result into accretion and erosion.
pub fn cumulative_change(
    times: &[Option<f64>],
    distances: &[Option<f64>],
) -> Result<CumulativeChange, SeriesLengthMismatch> {
    if times.len() != distances.len() {
        return Err(SeriesLengthMismatch {
            times: times.len(),
            values: distances.len(),
        });
    }

    let kept: Vec<(usize, f64, f64)> = times
        .iter()
        .zip(distances)
        .enumerate()
        .filter_map(|(row, (t, d))| Some((row, (*t)?, (*d)?)))
        .collect();

    let Some(&(_, _, baseline)) = kept.first() else {
        return Ok(CumulativeChange::default());
    };

    let change: Vec<f64> = kept.iter().map(|&(_, _, d)| d - baseline).collect();
    let (accretion, erosion) = split_accretion_erosion(&change);

    Ok(CumulativeChange {
        baseline: Some(baseline),
        times: kept.iter().map(|&(_, t, _)| t).collect(),
        rows: kept.iter().map(|&(row, _, _)| row).collect(),
        distances: kept.iter().map(|&(_, _, d)| d).collect(),
        change,
        accretion,
        erosion,
    })
}

/// Mutually exclusive masks: positive values into the first series, negative
/// values into the second, zeros elsewhere.
pub fn split_accretion_erosion(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    values
        .iter()
        .map(|&v| {
            if v > 0.0 {
                (v, 0.0)
            } else if v < 0.0 {
                (0.0, v)
            } else {
                (0.0, 0.0)
            }
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(times: &[f64]) -> Vec<Option<f64>> {
        times.iter().map(|&t| Some(t)).collect()
    }

    #[test]
    fn scenario_three_years() {
        let out = cumulative_change(&at(&[2019.0, 2020.0, 2021.0]), &[Some(10.0), Some(12.0), Some(8.0)]).unwrap();
        assert_eq!(out.baseline, Some(10.0));
        assert_eq!(out.change, vec![0.0, 2.0, -2.0]);
        assert_eq!(out.accretion, vec![0.0, 2.0, 0.0]);
        assert_eq!(out.erosion, vec![0.0, 0.0, -2.0]);
    }

    #[test]
    fn baseline_skips_leading_missing_values() {
        let out = cumulative_change(
            &at(&[2018.0, 2019.0, 2020.0, 2021.0]),
            &[None, Some(5.5), None, Some(4.0)],
        )
        .unwrap();
        assert_eq!(out.baseline, Some(5.5));
        assert_eq!(out.times, vec![2019.0, 2021.0]);
        assert_eq!(out.rows, vec![1, 3]);
        assert_eq!(out.change[0], 0.0);
        assert_eq!(out.change[1], -1.5);
    }

    #[test]
    fn all_missing_is_empty_not_error() {
        let out = cumulative_change(&at(&[2019.0, 2020.0]), &[None, None]).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.baseline, None);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = cumulative_change(&at(&[2019.0]), &[Some(1.0), Some(2.0)]).unwrap_err();
        assert_eq!(err, SeriesLengthMismatch { times: 1, values: 2 });
    }

    #[test]
    fn masks_partition_change() {
        let distances: Vec<Option<f64>> = [3.0, 7.25, -1.0, 3.0, 0.5, 9.0]
            .iter()
            .map(|&d| Some(d))
            .collect();
        let times: Vec<Option<f64>> = (0..distances.len()).map(|i| Some(2000.0 + i as f64)).collect();
        let out = cumulative_change(&times, &distances).unwrap();
        for i in 0..out.change.len() {
            let (c, a, e) = (out.change[i], out.accretion[i], out.erosion[i]);
            if c == 0.0 {
                assert_eq!((a, e), (0.0, 0.0));
            } else {
                assert_eq!(a + e, c);
                assert!(a == 0.0 || e == 0.0);
            }
        }
        assert_eq!(out.change[0], 0.0);
    }

    fn raw(headers: &[&str], rows: &[&[AttributeValue]]) -> RawTable {
        let mut columns = vec![Vec::new(); headers.len()];
        for row in rows {
            for (c, v) in row.iter().enumerate() {
                columns[c].push(v.clone());
            }
        }
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            columns,
        }
    }

    #[test]
    fn table_schema() {
        use AttributeValue::*;
        let table = raw(
            &["dates", "year", "NA1_distance_m", "NA2_distance_m", "satname"],
            &[
                &[String("2019-01-05 02:33:44+00:00".into()), Integer(2019), Float(10.0), Null, String("L8".into())],
                &[String("2020-07-02".into()), Float(2020.0), Float(12.0), Float(3.0), String("L9".into())],
            ],
        );
        let ts = TimeSeriesTable::from_raw(&table, "time_series_data").unwrap();
        assert_eq!(ts.years, vec![Some(2019), Some(2020)]);
        assert_eq!(
            ts.transects.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["NA1", "NA2"]
        );
        assert_eq!(ts.transects[1].distances, vec![None, Some(3.0)]);

        let times: Vec<f64> = ts.times(TimeAxis::Dates).into_iter().flatten().collect();
        assert!(times[0] > 2019.0 && times[0] < 2019.02);
        assert!((times[1] - 2020.5).abs() < 0.01);
        assert_eq!(ts.times(TimeAxis::Year), vec![Some(2019.0), Some(2020.0)]);
    }

    #[test]
    fn rows_without_a_time_are_left_out() {
        use AttributeValue::*;
        let table = raw(
            &["dates", "year", "NA1_distance_m"],
            &[
                &[Null, Integer(2018), Float(20.0)],
                &[String("2019-02-11".into()), Integer(2019), Float(10.0)],
                &[Null, Null, Float(11.0)],
                &[String("2021-02-11".into()), Integer(2021), Float(8.0)],
            ],
        );
        let ts = TimeSeriesTable::from_raw(&table, "time_series_data").unwrap();
        assert_eq!(ts.years, vec![Some(2018), Some(2019), None, Some(2021)]);

        // The undated first row must not become the baseline on the date axis.
        let by_date = cumulative_change(&ts.times(TimeAxis::Dates), &ts.transects[0].distances).unwrap();
        assert_eq!(by_date.baseline, Some(10.0));
        assert_eq!(by_date.rows, vec![1, 3]);
        assert_eq!(by_date.change, vec![0.0, -2.0]);

        let by_year = cumulative_change(&ts.times(TimeAxis::Year), &ts.transects[0].distances).unwrap();
        assert_eq!(by_year.baseline, Some(20.0));
        assert_eq!(by_year.rows, vec![0, 1, 3]);
        assert_eq!(by_year.times, vec![2018.0, 2019.0, 2021.0]);
    }

    #[test]
    fn missing_year_column_is_schema_error() {
        let table = raw(&["NA1_distance_m"], &[&[AttributeValue::Float(1.0)]]);
        assert!(matches!(
            TimeSeriesTable::from_raw(&table, "time_series_data"),
            Err(PanelError::SchemaField { .. })
        ));
    }

    #[test]
    fn date_formats() {
        for s in ["2021-03-04T05:06:07Z", "2021-03-04 05:06:07+00:00", "2021-03-04 05:06:07", "2021-03-04"] {
            let dt = parse_date(&AttributeValue::String(s.into())).unwrap();
            assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(), "{s}");
        }
        assert!(parse_date(&AttributeValue::Integer(2021)).is_none());
    }
}
