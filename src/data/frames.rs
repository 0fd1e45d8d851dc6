//! Year-bucketed map frames.
//!
//! A [`FrameBuilder`] takes any number of layers, each described by a
//! [`LayerSpec`] (legend label, colour, year-field aliases). Yearly layers are
//! bucketed by their year field, static layers are shared unchanged by every
//! frame. The union of all yearly buckets is the animation timeline.

use std::sync::Arc;

use eframe::egui::Color32;
use geo::{Geometry, LineString, Rect};

use super::filter::{YearBuckets, bucket_by_year, probe_field, timeline};
use super::model::{FeatureLayer, merge_rects};
use crate::error::{PanelError, PanelResult};

/// Drawing style and legend entry of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    pub label: String,
    pub color: Color32,
    pub width: f32,
}

/// How one layer takes part in the animation.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub style: LayerStyle,
    /// Hover title for the layer's features, e.g. "Shoreline".
    pub hover_title: String,
    /// Year-field aliases in priority order; empty for a static layer.
    pub year_fields: Vec<String>,
}

/// A drawable piece of one feature. Multi-part geometries decompose into one
/// primitive per part, all sharing the feature's hover label.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line { coords: Vec<[f64; 2]>, label: Arc<str> },
    Point { coord: [f64; 2], label: Arc<str> },
    Polygon { ring: Vec<[f64; 2]>, label: Arc<str> },
}

impl Primitive {
    pub fn label(&self) -> &str {
        match self {
            Primitive::Line { label, .. } | Primitive::Point { label, .. } | Primitive::Polygon { label, .. } => {
                &**label
            }
        }
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        match self {
            Primitive::Line { coords, .. } => coords.as_slice(),
            Primitive::Point { coord, .. } => std::slice::from_ref(coord),
            Primitive::Polygon { ring, .. } => ring.as_slice(),
        }
    }
}

/// One layer's primitives inside a frame. `layer` indexes
/// [`MapAnimation::legend`].
#[derive(Debug, Clone)]
pub struct LayerFrame {
    pub layer: usize,
    pub primitives: Arc<[Primitive]>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub year: i32,
    pub layers: Vec<LayerFrame>,
}

/// Ordered (year, layer-set) sequence ready for time scrubbing.
#[derive(Debug, Clone)]
pub struct MapAnimation {
    pub legend: Vec<LayerStyle>,
    pub frames: Vec<Frame>,
    /// Envelope of every loaded geometry, used to frame the map.
    pub bounds: Option<Rect<f64>>,
}

impl MapAnimation {
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.frames.iter().map(|f| f.year)
    }

    /// The most recent year, shown before the user scrubs.
    pub fn default_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

enum Participation {
    Static(Arc<[Primitive]>),
    Yearly(YearBuckets),
}

#[derive(Default)]
pub struct FrameBuilder<'a> {
    inputs: Vec<(LayerSpec, &'a FeatureLayer)>,
}

impl<'a> FrameBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, spec: LayerSpec, layer: &'a FeatureLayer) -> Self {
        self.inputs.push((spec, layer));
        self
    }

    /// Bucket every yearly layer and emit one frame per distinct year.
    ///
    /// Fails with a schema error naming the aliases when a yearly layer has
    /// none of its candidate year fields.
    pub fn build(self) -> PanelResult<MapAnimation> {
        let mut participation = Vec::with_capacity(self.inputs.len());
        for (spec, layer) in &self.inputs {
            if spec.year_fields.is_empty() {
                let all: Vec<usize> = (0..layer.len()).collect();
                participation.push(Participation::Static(primitives(layer, &all, &spec.hover_title).into()));
                continue;
            }
            let field = probe_field(&layer.column_names, &spec.year_fields)
                .found()
                .ok_or_else(|| PanelError::schema_field("year field", &spec.style.label, spec.year_fields.as_slice()))?;
            participation.push(Participation::Yearly(bucket_by_year(layer, field)));
        }

        let years = timeline(participation.iter().filter_map(|p| match p {
            Participation::Yearly(b) => Some(b),
            Participation::Static(_) => None,
        }));

        let frames = years
            .iter()
            .map(|&year| Frame {
                year,
                layers: participation
                    .iter()
                    .zip(&self.inputs)
                    .enumerate()
                    .map(|(i, (p, (spec, layer)))| LayerFrame {
                        layer: i,
                        primitives: match p {
                            Participation::Static(shared) => Arc::clone(shared),
                            Participation::Yearly(buckets) => {
                                let rows = buckets.get(&year).map(Vec::as_slice).unwrap_or(&[]);
                                primitives(layer, rows, &spec.hover_title).into()
                            }
                        },
                    })
                    .collect(),
            })
            .collect();

        let bounds = self
            .inputs
            .iter()
            .filter_map(|(_, layer)| layer.bounds())
            .reduce(merge_rects);

        Ok(MapAnimation {
            legend: self.inputs.into_iter().map(|(spec, _)| spec.style).collect(),
            frames,
            bounds,
        })
    }
}

fn primitives(layer: &FeatureLayer, rows: &[usize], title: &str) -> Vec<Primitive> {
    let mut out = Vec::new();
    for &row in rows {
        let feature = &layer.features[row];
        let label: Arc<str> = feature.describe(title).into();
        decompose(&feature.geometry, &label, &mut out);
    }
    out
}

fn line_coords(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

/// Split a geometry into drawable primitives by structural type.
pub fn decompose(geometry: &Geometry<f64>, label: &Arc<str>, out: &mut Vec<Primitive>) {
    match geometry {
        Geometry::LineString(line) => out.push(Primitive::Line {
            coords: line_coords(line),
            label: Arc::clone(label),
        }),
        Geometry::MultiLineString(lines) => out.extend(lines.iter().map(|line| Primitive::Line {
            coords: line_coords(line),
            label: Arc::clone(label),
        })),
        Geometry::Point(p) => out.push(Primitive::Point {
            coord: [p.x(), p.y()],
            label: Arc::clone(label),
        }),
        Geometry::MultiPoint(points) => out.extend(points.iter().map(|p| Primitive::Point {
            coord: [p.x(), p.y()],
            label: Arc::clone(label),
        })),
        Geometry::Polygon(poly) => out.push(Primitive::Polygon {
            ring: line_coords(poly.exterior()),
            label: Arc::clone(label),
        }),
        Geometry::MultiPolygon(polys) => out.extend(polys.iter().map(|poly| Primitive::Polygon {
            ring: line_coords(poly.exterior()),
            label: Arc::clone(label),
        })),
        other => log::debug!("skipping unsupported geometry {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AttributeValue, FeatureRecord};
    use geo::{MultiLineString, Point, line_string};
    use std::collections::BTreeMap;

    fn spec(label: &str, year_fields: &[&str]) -> LayerSpec {
        LayerSpec {
            style: LayerStyle {
                label: label.to_string(),
                color: Color32::BLUE,
                width: 2.0,
            },
            hover_title: label.trim_end_matches('s').to_string(),
            year_fields: year_fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn feature(geometry: Geometry<f64>, props: &[(&str, AttributeValue)]) -> FeatureRecord {
        FeatureRecord {
            geometry,
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn shorelines() -> FeatureLayer {
        FeatureLayer::from_features(
            vec![
                feature(
                    Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]),
                    &[("year", AttributeValue::Integer(2019))],
                ),
                feature(
                    Geometry::MultiLineString(MultiLineString(vec![
                        line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
                        line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0)],
                    ])),
                    &[("year", AttributeValue::Integer(2021))],
                ),
            ],
            0,
        )
    }

    fn intersections() -> FeatureLayer {
        FeatureLayer::from_features(
            vec![
                feature(Geometry::Point(Point::new(0.5, 0.5)), &[("end_year", AttributeValue::Integer(2020))]),
                feature(Geometry::Point(Point::new(0.7, 0.5)), &[("end_year", AttributeValue::Integer(2021))]),
            ],
            0,
        )
    }

    fn transects() -> FeatureLayer {
        FeatureLayer::from_features(
            vec![feature(
                Geometry::LineString(line_string![(x: 0.0, y: -1.0), (x: 0.0, y: 2.0)]),
                &[("name", AttributeValue::String("NA1".into()))],
            )],
            0,
        )
    }

    #[test]
    fn every_frame_carries_static_layer() {
        let (s, i, t) = (shorelines(), intersections(), transects());
        let animation = FrameBuilder::new()
            .layer(spec("Transects", &[]), &t)
            .layer(spec("Shorelines", &["year", "Year"]), &s)
            .layer(spec("Intersections", &["end_year", "year"]), &i)
            .build()
            .unwrap();

        assert_eq!(animation.years().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
        for frame in &animation.frames {
            assert_eq!(frame.layers.len(), 3);
            assert_eq!(frame.layers[0].primitives.len(), 1, "static layer missing in {}", frame.year);
        }
        // 2020 has no shoreline: empty, not missing.
        let f2020 = &animation.frames[1];
        assert!(f2020.layers[1].primitives.is_empty());
        assert_eq!(f2020.layers[2].primitives.len(), 1);
    }

    #[test]
    fn multipart_geometry_shares_label() {
        let (s, t) = (shorelines(), transects());
        let animation = FrameBuilder::new()
            .layer(spec("Transects", &[]), &t)
            .layer(spec("Shorelines", &["year"]), &s)
            .build()
            .unwrap();

        let last = animation.default_frame().unwrap();
        assert_eq!(last.year, 2021);
        let parts = &last.layers[1].primitives;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].label(), parts[1].label());
        assert!(parts[0].label().starts_with("Shoreline\n"));
    }

    #[test]
    fn missing_year_field_is_schema_error() {
        let t = transects();
        let err = FrameBuilder::new()
            .layer(spec("Shorelines", &["year", "Year"]), &t)
            .build()
            .unwrap_err();
        match err {
            PanelError::SchemaField { aliases, .. } => assert_eq!(aliases, vec!["year", "Year"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bounds_cover_all_layers() {
        let (s, t) = (shorelines(), transects());
        let animation = FrameBuilder::new()
            .layer(spec("Transects", &[]), &t)
            .layer(spec("Shorelines", &["year"]), &s)
            .build()
            .unwrap();
        let rect = animation.bounds.unwrap();
        assert_eq!((rect.min().x, rect.min().y), (0.0, -1.0));
        assert_eq!((rect.max().x, rect.max().y), (3.0, 2.0));
    }
}
