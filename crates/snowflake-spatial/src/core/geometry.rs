//! In-memory geometry model.
//!
//! A closed tagged union over the simple-feature geometry types plus an
//! axis-aligned [`Envelope`]. Coordinates are always two-dimensional.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::wkt;
use crate::error::{Result, SpatialError};

/// Spatial reference system identifier. `None` means unknown.
pub type Srid = Option<i32>;

/// A planar coordinate pair (x/easting, y/northing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Polygon with one exterior ring and zero or more holes.
///
/// Rings are stored closed (first coordinate repeated last).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Coord>,
    pub interiors: Vec<Vec<Coord>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coord>, interiors: Vec<Vec<Coord>>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// All rings, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Coord>> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }
}

/// Geometry value.
///
/// `LinearRing` only exists so a standalone ring can be handed to the codec;
/// neither WKB nor WKT has a ring type, so it is written as a line string.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    LinearRing(Vec<Coord>),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Convenience constructor for a point.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    /// Build a polygon without holes from `(x, y)` pairs.
    pub fn polygon_from(exterior: &[(f64, f64)]) -> Self {
        Geometry::Polygon(Polygon::new(
            exterior.iter().copied().map(Coord::from).collect(),
            Vec::new(),
        ))
    }

    /// Build a line string from `(x, y)` pairs.
    pub fn line_from(coords: &[(f64, f64)]) -> Self {
        Geometry::LineString(coords.iter().copied().map(Coord::from).collect())
    }

    /// Well-known keyword for this variant, as written in WKT.
    pub fn keyword(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::LineString(_) | Geometry::LinearRing(_) => "LINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::MultiPoint(_) => "MULTIPOINT",
            Geometry::MultiLineString(_) => "MULTILINESTRING",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
            Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        }
    }

    /// True for multi-variants and collections with no members.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(c) | Geometry::LinearRing(c) | Geometry::MultiPoint(c) => {
                c.is_empty()
            }
            Geometry::Polygon(p) => p.exterior.is_empty(),
            Geometry::MultiLineString(l) => l.is_empty(),
            Geometry::MultiPolygon(p) => p.is_empty(),
            Geometry::GeometryCollection(g) => g.iter().all(Geometry::is_empty),
        }
    }

    /// Replace a standalone linear ring with the equivalent line string.
    pub fn degrade_ring(self) -> Self {
        match self {
            Geometry::LinearRing(coords) => Geometry::LineString(coords),
            other => other,
        }
    }

    /// Visit every coordinate in vertex order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, f: &mut F) {
        match self {
            Geometry::Point(c) => f(c),
            Geometry::LineString(cs) | Geometry::LinearRing(cs) | Geometry::MultiPoint(cs) => {
                cs.iter().for_each(|c| f(c))
            }
            Geometry::Polygon(p) => p.rings().flatten().for_each(|c| f(c)),
            Geometry::MultiLineString(lines) => lines.iter().flatten().for_each(|c| f(c)),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(Polygon::rings)
                .flatten()
                .for_each(|c| f(c)),
            Geometry::GeometryCollection(children) => {
                for child in children {
                    child.for_each_coord(f);
                }
            }
        }
    }

    /// Bounding box of all coordinates, or `None` for an empty geometry.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut env: Option<Envelope> = None;
        self.for_each_coord(&mut |c| match env.as_mut() {
            Some(e) => e.expand_to_include(c),
            None => env = Some(Envelope::of_coord(c)),
        });
        env
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let text = wkt::encode_text(self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        wkt::decode_text(&text).map_err(serde::de::Error::custom)
    }
}

/// Axis-aligned minimum bounding rectangle.
///
/// Degenerate envelopes (equal bounds) are valid and represent a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope, rejecting inverted or non-finite bounds.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let env = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        env.validate()?;
        Ok(env)
    }

    fn of_coord(c: &Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Check the `min <= max` invariant on both axes.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SpatialError::InvalidPredicate(format!(
                "envelope bounds must be finite: {:?}",
                self
            )));
        }
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(SpatialError::InvalidPredicate(format!(
                "envelope minimum exceeds maximum: {:?}",
                self
            )));
        }
        Ok(())
    }

    pub fn expand_to_include(&mut self, c: &Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Closed five-point polygon over the envelope corners, counter-clockwise
    /// from the lower-left corner.
    pub fn to_polygon(&self) -> Geometry {
        Geometry::Polygon(Polygon::new(
            vec![
                Coord::new(self.min_x, self.min_y),
                Coord::new(self.max_x, self.min_y),
                Coord::new(self.max_x, self.max_y),
                Coord::new(self.min_x, self.max_y),
                Coord::new(self.min_x, self.min_y),
            ],
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_of_polygon_with_hole() {
        let poly = Geometry::Polygon(Polygon::new(
            vec![
                Coord::new(-2.0, -1.0),
                Coord::new(8.0, -1.0),
                Coord::new(8.0, 4.5),
                Coord::new(-2.0, -1.0),
            ],
            vec![vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
                Coord::new(0.0, 0.0),
            ]],
        ));
        let env = poly.envelope().unwrap();
        assert_eq!(env, Envelope::new(-2.0, -1.0, 8.0, 4.5).unwrap());
    }

    #[test]
    fn test_envelope_of_point_is_degenerate() {
        let env = Geometry::point(3.0, 4.0).envelope().unwrap();
        assert_eq!(env.width(), 0.0);
        assert_eq!(env.height(), 0.0);
        assert!(env.validate().is_ok());
    }

    #[test]
    fn test_empty_collection_has_no_envelope() {
        assert!(Geometry::GeometryCollection(vec![]).envelope().is_none());
        assert!(Geometry::MultiPoint(vec![]).is_empty());
    }

    #[test]
    fn test_envelope_rejects_inverted_bounds() {
        assert!(Envelope::new(10.0, 0.0, 0.0, 10.0).is_err());
        assert!(Envelope::new(0.0, 0.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_envelope_to_polygon_is_closed() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
        match env.to_polygon() {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior.len(), 5);
                assert_eq!(p.exterior.first(), p.exterior.last());
                assert_eq!(p.exterior[2], Coord::new(10.0, 10.0));
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_degrade_ring() {
        let ring = Geometry::LinearRing(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(0.0, 1.0),
            Coord::new(0.0, 0.0),
        ]);
        assert_eq!(ring.keyword(), "LINESTRING");
        assert!(matches!(ring.degrade_ring(), Geometry::LineString(c) if c.len() == 4));
    }

    #[test]
    fn test_serde_uses_wkt() {
        let json = serde_json::to_string(&Geometry::point(1.5, -2.0)).unwrap();
        assert_eq!(json, "\"POINT(1.5 -2)\"");
        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Geometry::point(1.5, -2.0));
    }
}
