//! Geometry codec: well-known binary (WKB) and well-known text (WKT).
//!
//! Both codecs are pure functions over their inputs. Encoders fail only when a
//! geometry violates a structural invariant (a line with fewer than two points,
//! a ring with fewer than four); decoders report the offset where input stopped
//! making sense.
//!
//! # Wire layouts
//!
//! ```text
//! WKB: [order: u8][type: u32][payload]            payload per type, recursive
//! WKT: KEYWORD(x y, x y, ...)                      rings and members parenthesized
//! ```

pub mod wkb;
pub mod wkt;

pub use wkb::{
    decode_binary, decode_binary_with_srid, encode_binary, encode_binary_with_srid, ByteOrder,
};
pub use wkt::{decode_text, decode_text_with_srid, encode_text};

use crate::core::geometry::{Coord, Geometry, Polygon};
use crate::error::{Result, SpatialError};

/// Minimum vertex count for a line string.
pub const MIN_LINE_POINTS: usize = 2;

/// Minimum vertex count for a closed ring (three distinct + closing vertex).
pub const MIN_RING_POINTS: usize = 4;

/// Maximum nesting depth accepted by the decoders.
pub(crate) const MAX_DEPTH: usize = 64;

fn check_coords(coords: &[Coord], min: usize, what: &str) -> Result<()> {
    if coords.len() < min {
        return Err(SpatialError::Encoding(format!(
            "{} has {} points, needs at least {}",
            what,
            coords.len(),
            min
        )));
    }
    if let Some(bad) = coords.iter().find(|c| !c.is_finite()) {
        return Err(SpatialError::Encoding(format!(
            "{} contains non-finite coordinate ({}, {})",
            what, bad.x, bad.y
        )));
    }
    Ok(())
}

fn check_polygon(polygon: &Polygon) -> Result<()> {
    check_coords(&polygon.exterior, MIN_RING_POINTS, "polygon exterior ring")?;
    for ring in &polygon.interiors {
        check_coords(ring, MIN_RING_POINTS, "polygon interior ring")?;
    }
    Ok(())
}

/// Check the structural invariants both encoders rely on.
pub(crate) fn validate(geometry: &Geometry) -> Result<()> {
    match geometry {
        Geometry::Point(c) => check_coords(std::slice::from_ref(c), 1, "point"),
        Geometry::LineString(coords) => check_coords(coords, MIN_LINE_POINTS, "line string"),
        Geometry::LinearRing(coords) => check_coords(coords, MIN_RING_POINTS, "linear ring"),
        Geometry::Polygon(p) => check_polygon(p),
        Geometry::MultiPoint(points) => check_coords(points, 0, "multipoint"),
        Geometry::MultiLineString(lines) => lines
            .iter()
            .try_for_each(|l| check_coords(l, MIN_LINE_POINTS, "multilinestring member")),
        Geometry::MultiPolygon(polys) => polys.iter().try_for_each(check_polygon),
        Geometry::GeometryCollection(children) => children.iter().try_for_each(validate),
    }
}
