//! Precomputed per-transect statistics (pass-through, display only).

use eframe::egui::Color32;

use super::model::{AttributeValue, RawTable};
use crate::error::{PanelError, PanelResult};

pub const TRANSECT_COLUMN: &str = "Transect";

/// Numeric columns every statistics table must carry, in display order.
pub const STAT_COLUMNS: [&str; 7] = [
    "Mean_Change_m",
    "Std_Dev_m",
    "Max_Erosion_m",
    "Max_Accretion_m",
    "Net_Change_m",
    "Rate_m_per_year",
    "N_Points",
];

/// One row of `transect_statistics`. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct TransectStatistic {
    pub transect: String,
    pub mean_change_m: f64,
    pub std_dev_m: f64,
    pub max_erosion_m: f64,
    pub max_accretion_m: f64,
    pub net_change_m: f64,
    pub rate_m_per_year: f64,
    pub n_points: f64,
}

impl TransectStatistic {
    /// `"Net: 2.5m | Rate: 0.42m/yr | Mean: 1.1±0.8m"`
    pub fn headline(&self) -> String {
        format!(
            "Net: {:.1}m | Rate: {:.2}m/yr | Mean: {:.1}±{:.1}m",
            self.net_change_m, self.rate_m_per_year, self.mean_change_m, self.std_dev_m
        )
    }
}

#[derive(Debug, Clone)]
pub struct StatisticsTable {
    pub rows: Vec<TransectStatistic>,
    /// Original table, kept for the on-screen table.
    pub raw: RawTable,
}

impl StatisticsTable {
    pub fn from_raw(table: RawTable, source_name: &str) -> PanelResult<Self> {
        let column = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| PanelError::schema_field(&format!("column {name}"), source_name, &[name]))
        };

        let keys = column(TRANSECT_COLUMN)?;
        let numeric = STAT_COLUMNS
            .iter()
            .map(|&name| column(name))
            .collect::<PanelResult<Vec<_>>>()?;
        let cell = |col: usize, row: usize| numeric[col][row].as_f64().unwrap_or(f64::NAN);

        let rows = (0..table.n_rows())
            .map(|r| TransectStatistic {
                transect: keys[r].to_string(),
                mean_change_m: cell(0, r),
                std_dev_m: cell(1, r),
                max_erosion_m: cell(2, r),
                max_accretion_m: cell(3, r),
                net_change_m: cell(4, r),
                rate_m_per_year: cell(5, r),
                n_points: cell(6, r),
            })
            .collect();

        Ok(StatisticsTable { rows, raw: table })
    }

    pub fn find(&self, transect: &str) -> Option<&TransectStatistic> {
        self.rows.iter().find(|r| r.transect == transect)
    }

    pub fn transects(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.transect.as_str()).collect()
    }

    /// Raw table with the six measured columns rounded to two decimals.
    /// `N_Points` and non-numeric columns are shown as read.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        let rounded: Vec<bool> = self
            .raw
            .headers
            .iter()
            .map(|h| STAT_COLUMNS[..6].contains(&h.as_str()))
            .collect();

        (0..self.raw.n_rows())
            .map(|r| {
                self.raw
                    .columns
                    .iter()
                    .zip(&rounded)
                    .map(|(col, &round)| format_cell(&col[r], round))
                    .collect()
            })
            .collect()
    }
}

fn format_cell(value: &AttributeValue, two_decimals: bool) -> String {
    match (two_decimals, value.as_f64()) {
        (true, Some(v)) => format!("{v:.2}"),
        _ if value.is_null() => String::new(),
        _ => value.to_string(),
    }
}

/// Bar colour by sign: negative values take `negative`, everything else
/// (including zero) takes `non_negative`.
pub fn sign_color(value: f64, negative: Color32, non_negative: Color32) -> Color32 {
    if value < 0.0 { negative } else { non_negative }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttributeValue::*;

    fn table(headers: &[&str], rows: Vec<Vec<AttributeValue>>) -> RawTable {
        let mut columns = vec![Vec::new(); headers.len()];
        for row in rows {
            for (c, v) in row.into_iter().enumerate() {
                columns[c].push(v);
            }
        }
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            columns,
        }
    }

    fn full_headers() -> Vec<&'static str> {
        let mut h = vec![TRANSECT_COLUMN];
        h.extend(STAT_COLUMNS);
        h
    }

    fn sample() -> StatisticsTable {
        let raw = table(
            &full_headers(),
            vec![
                vec![String("NA1".into()), Float(1.234), Float(0.5), Float(-3.0), Float(4.0), Float(2.456), Float(0.419), Integer(12)],
                vec![String("NA2".into()), Float(-0.5), Float(1.0), Float(-5.25), Float(1.0), Float(-4.0), Float(-0.8), Integer(9)],
            ],
        );
        StatisticsTable::from_raw(raw, "transect_statistics").unwrap()
    }

    #[test]
    fn rows_are_keyed_by_transect() {
        let stats = sample();
        assert_eq!(stats.transects(), vec!["NA1", "NA2"]);
        let na2 = stats.find("NA2").unwrap();
        assert_eq!(na2.net_change_m, -4.0);
        assert_eq!(na2.n_points, 9.0);
        assert!(stats.find("NA9").is_none());
    }

    #[test]
    fn headline_format() {
        let stats = sample();
        assert_eq!(
            stats.find("NA1").unwrap().headline(),
            "Net: 2.5m | Rate: 0.42m/yr | Mean: 1.2±0.5m"
        );
    }

    #[test]
    fn display_rounds_measured_columns_only() {
        let rows = sample().display_rows();
        assert_eq!(rows[0][0], "NA1");
        assert_eq!(rows[0][1], "1.23");
        assert_eq!(rows[0][5], "2.46");
        assert_eq!(rows[1][3], "-5.25");
        assert_eq!(rows[0][7], "12");
    }

    #[test]
    fn missing_column_names_it() {
        let headers: Vec<&str> = full_headers().into_iter().filter(|h| *h != "Rate_m_per_year").collect();
        let raw = table(&headers, vec![]);
        match StatisticsTable::from_raw(raw, "transect_statistics") {
            Err(PanelError::SchemaField { aliases, .. }) => assert_eq!(aliases, vec!["Rate_m_per_year"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn zero_is_non_negative() {
        let (neg, pos) = (Color32::RED, Color32::GREEN);
        assert_eq!(sign_color(-0.01, neg, pos), neg);
        assert_eq!(sign_color(0.0, neg, pos), pos);
        assert_eq!(sign_color(3.0, neg, pos), pos);
    }
}
