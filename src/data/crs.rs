//! Coordinate reference handling for vector inputs.
//!
//! Every layer is reprojected to WGS84 lon/lat on load. Only the references
//! coastal-monitoring exports actually use are supported: geographic WGS84,
//! Web Mercator and the WGS84 UTM zones.

use std::f64::consts::PI;
use std::fmt;

use anyhow::{Result, bail};
use geo::{Coord, Geometry, MapCoords};

/// WGS84 semi-major axis (m).
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian.
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A supported source coordinate reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// EPSG:4326 / OGC CRS84, lon/lat degrees.
    Wgs84,
    /// EPSG:3857, spherical Web Mercator metres.
    WebMercator,
    /// EPSG:326zz (north) / EPSG:327zz (south).
    Utm { zone: u8, north: bool },
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Wgs84 => write!(f, "EPSG:4326"),
            Crs::WebMercator => write!(f, "EPSG:3857"),
            Crs::Utm { zone, north: true } => write!(f, "EPSG:{}", 32600 + u32::from(*zone)),
            Crs::Utm { zone, north: false } => write!(f, "EPSG:{}", 32700 + u32::from(*zone)),
        }
    }
}

impl Crs {
    /// Parse a reference name as written in a GeoJSON `crs` member or config:
    /// `EPSG:32651`, `urn:ogc:def:crs:EPSG::32651`, `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.to_ascii_uppercase().ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }
        let code = name
            .rsplit(':')
            .next()
            .and_then(|c| c.trim().parse::<u32>().ok());
        match code {
            Some(code) => Self::from_epsg(code),
            None => bail!("Unrecognised coordinate reference name '{name}'"),
        }
    }

    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3857 | 900913 | 3785 => Ok(Crs::WebMercator),
            32601..=32660 => Ok(Crs::Utm { zone: (code - 32600) as u8, north: true }),
            32701..=32760 => Ok(Crs::Utm { zone: (code - 32700) as u8, north: false }),
            other => bail!(
                "Unsupported coordinate reference EPSG:{other} \
                 (supported: EPSG:4326, EPSG:3857, WGS84 UTM zones)"
            ),
        }
    }

    /// Projected (x, y) → (lon, lat) degrees.
    pub fn to_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Crs::Wgs84 => c,
            Crs::WebMercator => mercator_inverse(c),
            Crs::Utm { zone, north } => utm_inverse(c, zone, north),
        }
    }

    /// (lon, lat) degrees → projected (x, y).
    pub fn from_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Crs::Wgs84 => c,
            Crs::WebMercator => mercator_forward(c),
            Crs::Utm { zone, north } => utm_forward(c, zone, north),
        }
    }

    /// Reproject a geometry into WGS84. Identity for WGS84 input.
    pub fn reproject(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        if *self == Crs::Wgs84 {
            return geometry;
        }
        geometry.map_coords(|c| self.to_wgs84(c))
    }
}

/// Whether a coordinate could be geographic lon/lat.
pub fn is_geographic(c: Coord<f64>) -> bool {
    c.x.abs() <= 180.0 && c.y.abs() <= 90.0
}

// -- Web Mercator --

fn mercator_inverse(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / WGS84_A).to_degrees();
    let lat = (2.0 * (c.y / WGS84_A).exp().atan() - PI / 2.0).to_degrees();
    Coord { x: lon, y: lat }
}

fn mercator_forward(c: Coord<f64>) -> Coord<f64> {
    let x = WGS84_A * c.x.to_radians();
    let y = WGS84_A * (PI / 4.0 + c.y.to_radians() / 2.0).tan().ln();
    Coord { x, y }
}

// -- Transverse Mercator (Snyder, USGS PP 1395, eqs. 8-9 .. 8-25) --

fn central_meridian(zone: u8) -> f64 {
    (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0
}

fn utm_inverse(c: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);
    let x = c.x - UTM_FALSE_EASTING;
    let y = if north { c.y } else { c.y - UTM_FALSE_NORTHING_SOUTH };

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin1, cos1) = phi1.sin_cos();
    let tan1 = phi1.tan();
    let c1 = ep2 * cos1.powi(2);
    let t1 = tan1.powi(2);
    let n1 = WGS84_A / (1.0 - e2 * sin1.powi(2)).sqrt();
    let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin1.powi(2)).powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);
    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2)) * d.powi(5)
            / 120.0)
        / cos1;

    Coord {
        x: central_meridian(zone) + lon.to_degrees(),
        y: lat.to_degrees(),
    }
}

fn utm_forward(c: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);
    let lat = c.y.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let tan_lat = lat.tan();

    let n = WGS84_A / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    let t = tan_lat.powi(2);
    let cc = ep2 * cos_lat.powi(2);
    let a = cos_lat * (c.x - central_meridian(zone)).to_radians();

    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * lat).sin());

    let x = UTM_K0
        * n
        * (a + (1.0 - t + cc) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * cc - 58.0 * ep2) * a.powi(5) / 120.0)
        + UTM_FALSE_EASTING;
    let mut y = UTM_K0
        * (m + n
            * tan_lat
            * (a.powi(2) / 2.0
                + (5.0 - t + 9.0 * cc + 4.0 * cc.powi(2)) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * cc - 330.0 * ep2) * a.powi(6) / 720.0));
    if !north {
        y += UTM_FALSE_NORTHING_SOUTH;
    }
    Coord { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect, LineString};

    fn close(a: Coord<f64>, b: Coord<f64>, tol: f64) -> bool {
        (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
    }

    #[test]
    fn parses_common_names() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::Wgs84);
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG::32651").unwrap(),
            Crs::Utm { zone: 51, north: true }
        );
        assert_eq!(
            Crs::parse("EPSG:32755").unwrap(),
            Crs::Utm { zone: 55, north: false }
        );
        assert_eq!(Crs::parse("EPSG:3857").unwrap(), Crs::WebMercator);
        assert!(Crs::parse("EPSG:2154").is_err());
        assert!(Crs::parse("lambert").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for crs in [
            Crs::Wgs84,
            Crs::WebMercator,
            Crs::Utm { zone: 51, north: true },
            Crs::Utm { zone: 19, north: false },
        ] {
            assert_eq!(Crs::parse(&crs.to_string()).unwrap(), crs);
        }
    }

    #[test]
    fn utm_known_point() {
        // Central meridian of zone 51 on the equator.
        let c = Crs::Utm { zone: 51, north: true }.to_wgs84(Coord { x: 500_000.0, y: 0.0 });
        assert!(close(c, Coord { x: 123.0, y: 0.0 }, 1e-9));
    }

    #[test]
    fn utm_round_trip_near_site() {
        let crs = Crs::Utm { zone: 51, north: true };
        let lonlat = Coord { x: 121.2, y: 14.63 };
        let back = crs.to_wgs84(crs.from_wgs84(lonlat));
        assert!(close(back, lonlat, 1e-7), "{back:?}");

        let south = Crs::Utm { zone: 56, north: false };
        let sydney = Coord { x: 151.21, y: -33.86 };
        assert!(close(south.to_wgs84(south.from_wgs84(sydney)), sydney, 1e-7));
    }

    #[test]
    fn mercator_round_trip() {
        let p = Coord { x: 121.2, y: 14.63 };
        let back = Crs::WebMercator.to_wgs84(Crs::WebMercator.from_wgs84(p));
        assert!(close(back, p, 1e-9));
    }

    #[test]
    fn reprojected_bounds_match_envelope() {
        let crs = Crs::Utm { zone: 51, north: true };
        let lonlat = [
            Coord { x: 121.20, y: 14.60 },
            Coord { x: 121.21, y: 14.61 },
            Coord { x: 121.22, y: 14.62 },
        ];
        let projected: LineString<f64> = lonlat.iter().map(|c| crs.from_wgs84(*c)).collect();
        let back = crs.reproject(Geometry::LineString(projected));
        let rect = back.bounding_rect().unwrap();
        assert!(close(rect.min(), lonlat[0], 1e-7));
        assert!(close(rect.max(), lonlat[2], 1e-7));
        if let Geometry::LineString(ls) = back {
            assert_eq!(ls.0.len(), 3);
        } else {
            panic!("geometry kind changed");
        }
    }
}
