use std::collections::{BTreeMap, BTreeSet};

use super::model::FeatureLayer;

// ---------------------------------------------------------------------------
// Field probing: which alias names the year attribute
// ---------------------------------------------------------------------------

/// Result of probing a schema for the first matching candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProbe<'a> {
    Found(&'a str),
    NotFound,
}

impl<'a> FieldProbe<'a> {
    pub fn found(self) -> Option<&'a str> {
        match self {
            FieldProbe::Found(name) => Some(name),
            FieldProbe::NotFound => None,
        }
    }
}

/// Check `candidates` in priority order against the known attribute set.
pub fn probe_field<'a, S: AsRef<str>>(columns: &BTreeSet<String>, candidates: &'a [S]) -> FieldProbe<'a> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .find(|name| columns.contains(*name))
        .map_or(FieldProbe::NotFound, FieldProbe::Found)
}

// ---------------------------------------------------------------------------
// Year buckets: year → indices of the features in that year
// ---------------------------------------------------------------------------

/// Feature indices grouped by year, ascending.
pub type YearBuckets = BTreeMap<i32, Vec<usize>>;

/// Group the layer's features by the year read from `field`.
///
/// Features whose value is null or has no recognisable year fall into no
/// bucket.
pub fn bucket_by_year(layer: &FeatureLayer, field: &str) -> YearBuckets {
    let mut buckets = YearBuckets::new();
    let mut skipped = 0usize;
    for (i, feature) in layer.features.iter().enumerate() {
        match feature.properties.get(field).and_then(|v| v.as_year()) {
            Some(year) => buckets.entry(year).or_default().push(i),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("{skipped} features without a usable '{field}' value left out of the timeline");
    }
    buckets
}

/// Union of the distinct years of every bucket set, strictly ascending.
pub fn timeline<'a>(bucket_sets: impl IntoIterator<Item = &'a YearBuckets>) -> Vec<i32> {
    bucket_sets
        .into_iter()
        .flat_map(|b| b.keys().copied())
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AttributeValue, FeatureRecord};
    use geo::{Geometry, Point};

    fn layer(field: &str, years: &[AttributeValue]) -> FeatureLayer {
        let features = years
            .iter()
            .map(|y| FeatureRecord {
                geometry: Geometry::Point(Point::new(0.0, 0.0)),
                properties: BTreeMap::from([(field.to_string(), y.clone())]),
            })
            .collect();
        FeatureLayer::from_features(features, 0)
    }

    #[test]
    fn probe_respects_priority() {
        let columns: BTreeSet<String> = ["Year", "end_year"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            probe_field(&columns, &["end_year", "endYear", "year", "Year"]),
            FieldProbe::Found("end_year")
        );
        assert_eq!(probe_field(&columns, &["year", "Year"]), FieldProbe::Found("Year"));
        assert_eq!(probe_field(&columns, &["date", "Date"]), FieldProbe::NotFound);
        assert_eq!(probe_field(&columns, &["date"]).found(), None);
    }

    #[test]
    fn union_of_differently_named_fields() {
        let change = layer(
            "end_year",
            &[AttributeValue::Integer(2020), AttributeValue::Integer(2022), AttributeValue::Integer(2020)],
        );
        let shorelines = layer("year", &[AttributeValue::Integer(2021)]);

        let a = bucket_by_year(&change, "end_year");
        let b = bucket_by_year(&shorelines, "year");
        assert_eq!(a.get(&2020), Some(&vec![0, 2]));
        assert_eq!(timeline([&a, &b]), vec![2020, 2021, 2022]);
    }

    #[test]
    fn timeline_is_strictly_ascending_without_duplicates() {
        let a = bucket_by_year(
            &layer("year", &[2024, 2019, 2024, 2021].map(AttributeValue::Integer)),
            "year",
        );
        let b = bucket_by_year(
            &layer("year", &[2021, 2019, 2030].map(AttributeValue::Integer)),
            "year",
        );
        let years = timeline([&a, &b]);
        assert_eq!(years, vec![2019, 2021, 2024, 2030]);
        assert!(years.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unusable_values_are_left_out() {
        let l = layer(
            "date",
            &[
                AttributeValue::String("2019-03-04".into()),
                AttributeValue::Null,
                AttributeValue::String("unknown".into()),
            ],
        );
        let buckets = bucket_by_year(&l, "date");
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&2019], vec![0]);
    }
}
