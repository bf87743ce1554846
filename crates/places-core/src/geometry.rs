// crates/places-core/src/geometry.rs

//! # Geo Math
//!
//! Great-circle distance and containment tests used by the proximity boost
//! and the geometry filters. Points are `(lat, lng)` in degrees; polygons
//! are handed to `geo` as `(x = lng, y = lat)`.

use crate::error::{PlacesError, Result};
use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

fn deg_to_rad(deg: f64) -> f64 {
    (deg % 360.0).to_radians()
}

/// A WGS84 point in degrees.
///
/// Deserializes from either `"lat, lng"` or `[lat, lng]` and always
/// serializes as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordsRepr", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when the point lies inside the valid WGS84 range.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(p: LatLng) -> Self {
        [p.lat, p.lng]
    }
}

impl FromStr for LatLng {
    type Err = PlacesError;

    fn from_str(s: &str) -> Result<Self> {
        let values = parse_number_list("aroundLatLng", s)?;
        match values.as_slice() {
            [lat, lng] => checked_point("aroundLatLng", *lat, *lng),
            _ => Err(PlacesError::invalid_param(
                "aroundLatLng",
                format!("expected `lat,lng`, got {s:?}"),
            )),
        }
    }
}

/// Great-circle distance in meters (haversine, mean Earth radius).
pub fn haversine_distance(a: LatLng, b: LatLng) -> f64 {
    let d_lat = deg_to_rad(b.lat - a.lat);
    let d_lng = deg_to_rad(b.lng - a.lng);
    let lat1 = deg_to_rad(a.lat);
    let lat2 = deg_to_rad(b.lat);

    let h = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();

    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// [`haversine_distance`] floored to whole meters, as reported in boosts.
pub fn distance_between(a: LatLng, b: LatLng) -> f64 {
    haversine_distance(a, b).floor()
}

/// Tests `point` against a closed ring (first vertex repeated last).
///
/// Points on the boundary are outside.
pub fn point_in_polygon(point: LatLng, ring: &[LatLng]) -> bool {
    to_polygon(ring).contains(&point.to_point())
}

fn to_polygon(ring: &[LatLng]) -> Polygon<f64> {
    let exterior: LineString<f64> = ring
        .iter()
        .map(|p| Coord { x: p.lng, y: p.lat })
        .collect::<Vec<_>>()
        .into();
    Polygon::new(exterior, Vec::new())
}

// -----------------------------------------------------------------------------
// BOUNDING BOX
// -----------------------------------------------------------------------------

/// Two opposite corners `p1Lat, p1Lng, p2Lat, p2Lng`.
///
/// Containment is evaluated as a closed four-corner polygon so it behaves
/// exactly like [`PolygonRing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberListRepr", into = "[f64; 4]")]
pub struct BoundingBox {
    corners: [f64; 4],
    polygon: Polygon<f64>,
}

impl BoundingBox {
    pub fn new(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<Self> {
        let p1 = checked_point("insideBoundingBox", lat1, lng1)?;
        let p2 = checked_point("insideBoundingBox", lat2, lng2)?;
        if p1.lat == p2.lat || p1.lng == p2.lng {
            return Err(PlacesError::invalid_param(
                "insideBoundingBox",
                "corners must differ in both latitude and longitude",
            ));
        }

        let ring = vec![
            LatLng::new(p1.lat, p2.lng),
            LatLng::new(p1.lat, p1.lng),
            LatLng::new(p2.lat, p1.lng),
            LatLng::new(p2.lat, p2.lng),
            LatLng::new(p1.lat, p2.lng),
        ];

        Ok(Self {
            corners: [lat1, lng1, lat2, lng2],
            polygon: to_polygon(&ring),
        })
    }

    pub fn corners(&self) -> [f64; 4] {
        self.corners
    }

    pub fn contains(&self, point: LatLng) -> bool {
        self.polygon.contains(&point.to_point())
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        b.corners
    }
}

impl TryFrom<Vec<f64>> for BoundingBox {
    type Error = PlacesError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        match values.as_slice() {
            [lat1, lng1, lat2, lng2] => BoundingBox::new(*lat1, *lng1, *lat2, *lng2),
            _ => Err(PlacesError::invalid_param(
                "insideBoundingBox",
                format!("expected 4 numbers, got {}", values.len()),
            )),
        }
    }
}

impl FromStr for BoundingBox {
    type Err = PlacesError;

    fn from_str(s: &str) -> Result<Self> {
        parse_number_list("insideBoundingBox", s)?.try_into()
    }
}

// -----------------------------------------------------------------------------
// POLYGON
// -----------------------------------------------------------------------------

/// A polygon given as a flat `lat1, lng1, lat2, lng2, ...` list.
///
/// Open rings are closed automatically; the flat list is kept as given for
/// echoing back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberListRepr", into = "Vec<f64>")]
pub struct PolygonRing {
    coords: Vec<f64>,
    ring: Vec<LatLng>,
    polygon: Polygon<f64>,
}

impl PolygonRing {
    pub fn new(coords: Vec<f64>) -> Result<Self> {
        if coords.len() % 2 != 0 {
            return Err(PlacesError::invalid_param(
                "insidePolygon",
                "expected an even number of coordinates",
            ));
        }

        let mut ring = coords
            .chunks_exact(2)
            .map(|pair| checked_point("insidePolygon", pair[0], pair[1]))
            .collect::<Result<Vec<_>>>()?;

        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }

        // closed ring: at least three distinct vertices plus the repeat
        if ring.len() < 4 {
            return Err(PlacesError::invalid_param(
                "insidePolygon",
                "a polygon needs at least 3 points",
            ));
        }

        let polygon = to_polygon(&ring);
        Ok(Self {
            coords,
            ring,
            polygon,
        })
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn ring(&self) -> &[LatLng] {
        &self.ring
    }

    pub fn contains(&self, point: LatLng) -> bool {
        self.polygon.contains(&point.to_point())
    }
}

impl From<PolygonRing> for Vec<f64> {
    fn from(p: PolygonRing) -> Self {
        p.coords
    }
}

impl TryFrom<Vec<f64>> for PolygonRing {
    type Error = PlacesError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        PolygonRing::new(values)
    }
}

impl FromStr for PolygonRing {
    type Err = PlacesError;

    fn from_str(s: &str) -> Result<Self> {
        PolygonRing::new(parse_number_list("insidePolygon", s)?)
    }
}

// -----------------------------------------------------------------------------
// PARSING HELPERS
// -----------------------------------------------------------------------------

/// Wire forms accepted for a point.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordsRepr {
    Text(String),
    Pair([f64; 2]),
}

impl TryFrom<CoordsRepr> for LatLng {
    type Error = PlacesError;

    fn try_from(repr: CoordsRepr) -> Result<Self> {
        match repr {
            CoordsRepr::Text(s) => s.parse(),
            CoordsRepr::Pair([lat, lng]) => checked_point("aroundLatLng", lat, lng),
        }
    }
}

/// Wire forms accepted for boxes and polygons.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberListRepr {
    Text(String),
    List(Vec<f64>),
}

impl TryFrom<NumberListRepr> for BoundingBox {
    type Error = PlacesError;

    fn try_from(repr: NumberListRepr) -> Result<Self> {
        match repr {
            NumberListRepr::Text(s) => s.parse(),
            NumberListRepr::List(values) => values.try_into(),
        }
    }
}

impl TryFrom<NumberListRepr> for PolygonRing {
    type Error = PlacesError;

    fn try_from(repr: NumberListRepr) -> Result<Self> {
        match repr {
            NumberListRepr::Text(s) => s.parse(),
            NumberListRepr::List(values) => PolygonRing::new(values),
        }
    }
}

fn parse_number_list(name: &'static str, s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| PlacesError::invalid_param(name, format!("{part:?}: {e}")))
        })
        .collect()
}

fn checked_point(name: &'static str, lat: f64, lng: f64) -> Result<LatLng> {
    let p = LatLng::new(lat, lng);
    if p.is_valid() {
        Ok(p)
    } else {
        Err(PlacesError::invalid_param(
            name,
            format!("({lat}, {lng}) is outside the valid lat/lng range"),
        ))
    }
}
