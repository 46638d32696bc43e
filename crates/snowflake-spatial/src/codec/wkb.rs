//! Well-known binary geometry encoding.
//!
//! Layout of every (sub)geometry:
//!
//! ```text
//! [order: u8]        0 = big endian (XDR), 1 = little endian (NDR)
//! [type: u32]        1 Point .. 7 GeometryCollection, optional EWKB flags
//! [srid: i32]        only when the EWKB SRID flag (0x2000_0000) is set
//! [payload]          coordinates as f64 pairs, counts as u32
//! ```
//!
//! Collections repeat the full header for every member, and each member may
//! use its own byte order. The encoder always writes little endian.

use bytes::{Buf, BufMut};

use super::{validate, MAX_DEPTH};
use crate::codec::{MIN_LINE_POINTS, MIN_RING_POINTS};
use crate::core::geometry::{Coord, Geometry, Polygon, Srid};
use crate::error::{Result, SpatialError};

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOINT: u32 = 4;
const WKB_MULTILINESTRING: u32 = 5;
const WKB_MULTIPOLYGON: u32 = 6;
const WKB_GEOMETRYCOLLECTION: u32 = 7;

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_FLAGS: u32 = EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG;

/// Size of one encoded coordinate pair.
const COORD_SIZE: usize = 16;

/// Byte order marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(ByteOrder::BigEndian),
            1 => Some(ByteOrder::LittleEndian),
            _ => None,
        }
    }

    fn flag(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }
}

fn type_code(geometry: &Geometry) -> u32 {
    match geometry {
        Geometry::Point(_) => WKB_POINT,
        Geometry::LineString(_) | Geometry::LinearRing(_) => WKB_LINESTRING,
        Geometry::Polygon(_) => WKB_POLYGON,
        Geometry::MultiPoint(_) => WKB_MULTIPOINT,
        Geometry::MultiLineString(_) => WKB_MULTILINESTRING,
        Geometry::MultiPolygon(_) => WKB_MULTIPOLYGON,
        Geometry::GeometryCollection(_) => WKB_GEOMETRYCOLLECTION,
    }
}

/// Encode a geometry as little-endian WKB.
///
/// Standalone linear rings are written as line strings.
pub fn encode_binary(geometry: &Geometry) -> Result<Vec<u8>> {
    validate(geometry)?;
    let mut buf = Vec::with_capacity(encoded_len(geometry));
    write_geometry(&mut buf, geometry, None)?;
    Ok(buf)
}

/// Encode with an EWKB SRID header when `srid` is known.
pub fn encode_binary_with_srid(geometry: &Geometry, srid: Srid) -> Result<Vec<u8>> {
    validate(geometry)?;
    let mut buf = Vec::with_capacity(encoded_len(geometry) + 4);
    write_geometry(&mut buf, geometry, srid)?;
    Ok(buf)
}

fn encoded_len(geometry: &Geometry) -> usize {
    let header = 5;
    match geometry {
        Geometry::Point(_) => header + COORD_SIZE,
        Geometry::LineString(c) | Geometry::LinearRing(c) => header + 4 + c.len() * COORD_SIZE,
        Geometry::Polygon(p) => header + polygon_len(p),
        Geometry::MultiPoint(c) => header + 4 + c.len() * (header + COORD_SIZE),
        Geometry::MultiLineString(lines) => {
            header + 4 + lines.iter().map(|l| header + 4 + l.len() * COORD_SIZE).sum::<usize>()
        }
        Geometry::MultiPolygon(polys) => {
            header + 4 + polys.iter().map(|p| header + polygon_len(p)).sum::<usize>()
        }
        Geometry::GeometryCollection(children) => {
            header + 4 + children.iter().map(encoded_len).sum::<usize>()
        }
    }
}

fn polygon_len(p: &Polygon) -> usize {
    4 + p.rings().map(|r| 4 + r.len() * COORD_SIZE).sum::<usize>()
}

fn count(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| SpatialError::Encoding(format!("{} count {} exceeds u32", what, len)))
}

fn write_header(buf: &mut Vec<u8>, code: u32, srid: Srid) {
    buf.put_u8(ByteOrder::LittleEndian.flag());
    match srid {
        Some(srid) => {
            buf.put_u32_le(code | EWKB_SRID_FLAG);
            buf.put_i32_le(srid);
        }
        None => buf.put_u32_le(code),
    }
}

fn write_coords(buf: &mut Vec<u8>, coords: &[Coord]) -> Result<()> {
    buf.put_u32_le(count(coords.len(), "point")?);
    for c in coords {
        buf.put_f64_le(c.x);
        buf.put_f64_le(c.y);
    }
    Ok(())
}

fn write_polygon_body(buf: &mut Vec<u8>, polygon: &Polygon) -> Result<()> {
    buf.put_u32_le(count(1 + polygon.interiors.len(), "ring")?);
    for ring in polygon.rings() {
        write_coords(buf, ring)?;
    }
    Ok(())
}

fn write_geometry(buf: &mut Vec<u8>, geometry: &Geometry, srid: Srid) -> Result<()> {
    write_header(buf, type_code(geometry), srid);
    match geometry {
        Geometry::Point(c) => {
            buf.put_f64_le(c.x);
            buf.put_f64_le(c.y);
        }
        Geometry::LineString(coords) | Geometry::LinearRing(coords) => write_coords(buf, coords)?,
        Geometry::Polygon(p) => write_polygon_body(buf, p)?,
        Geometry::MultiPoint(points) => {
            buf.put_u32_le(count(points.len(), "member")?);
            for p in points {
                write_geometry(buf, &Geometry::Point(*p), None)?;
            }
        }
        Geometry::MultiLineString(lines) => {
            buf.put_u32_le(count(lines.len(), "member")?);
            for line in lines {
                write_header(buf, WKB_LINESTRING, None);
                write_coords(buf, line)?;
            }
        }
        Geometry::MultiPolygon(polys) => {
            buf.put_u32_le(count(polys.len(), "member")?);
            for p in polys {
                write_header(buf, WKB_POLYGON, None);
                write_polygon_body(buf, p)?;
            }
        }
        Geometry::GeometryCollection(children) => {
            buf.put_u32_le(count(children.len(), "member")?);
            for child in children {
                write_geometry(buf, child, None)?;
            }
        }
    }
    Ok(())
}

/// Decode a WKB (or EWKB) buffer, discarding any embedded SRID.
pub fn decode_binary(data: &[u8]) -> Result<Geometry> {
    decode_binary_with_srid(data).map(|(geometry, _)| geometry)
}

/// Decode a WKB (or EWKB) buffer, returning the SRID embedded in the
/// top-level header if present.
pub fn decode_binary_with_srid(data: &[u8]) -> Result<(Geometry, Srid)> {
    let mut reader = WkbReader::new(data);
    let (geometry, srid) = reader.read_geometry(0)?;
    if reader.remaining() > 0 {
        return Err(SpatialError::malformed(
            reader.offset(),
            format!("{} trailing bytes after geometry", reader.remaining()),
        ));
    }
    Ok((geometry, srid))
}

/// Cursor over a WKB buffer that tracks its byte offset for error reporting.
struct WkbReader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> WkbReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            buf: data,
            len: data.len(),
        }
    }

    fn offset(&self) -> usize {
        self.len - self.buf.remaining()
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(SpatialError::malformed(
                self.offset(),
                format!(
                    "truncated {}: need {} bytes, have {}",
                    what,
                    n,
                    self.buf.remaining()
                ),
            ));
        }
        Ok(())
    }

    fn read_u32(&mut self, order: ByteOrder, what: &str) -> Result<u32> {
        self.need(4, what)?;
        Ok(match order {
            ByteOrder::BigEndian => self.buf.get_u32(),
            ByteOrder::LittleEndian => self.buf.get_u32_le(),
        })
    }

    fn read_i32(&mut self, order: ByteOrder, what: &str) -> Result<i32> {
        self.need(4, what)?;
        Ok(match order {
            ByteOrder::BigEndian => self.buf.get_i32(),
            ByteOrder::LittleEndian => self.buf.get_i32_le(),
        })
    }

    fn read_raw_coord(&mut self, order: ByteOrder) -> Result<Coord> {
        self.need(COORD_SIZE, "coordinate")?;
        let (x, y) = match order {
            ByteOrder::BigEndian => (self.buf.get_f64(), self.buf.get_f64()),
            ByteOrder::LittleEndian => (self.buf.get_f64_le(), self.buf.get_f64_le()),
        };
        Ok(Coord::new(x, y))
    }

    /// Read a coordinate pair; both ordinates must be finite.
    fn read_coord(&mut self, order: ByteOrder) -> Result<Coord> {
        let at = self.offset();
        let c = self.read_raw_coord(order)?;
        finite_at(at, c)
    }

    /// Read an element count and make sure the buffer could hold that many
    /// elements of at least `min_size` bytes each.
    fn read_count(&mut self, order: ByteOrder, min_size: usize, what: &str) -> Result<usize> {
        let at = self.offset();
        let n = self.read_u32(order, what)? as usize;
        if n.saturating_mul(min_size) > self.buf.remaining() {
            return Err(SpatialError::malformed(
                at,
                format!(
                    "{} count {} exceeds remaining {} bytes",
                    what,
                    n,
                    self.buf.remaining()
                ),
            ));
        }
        Ok(n)
    }

    fn read_coords(&mut self, order: ByteOrder, min: usize, what: &str) -> Result<Vec<Coord>> {
        let at = self.offset();
        let n = self.read_count(order, COORD_SIZE, what)?;
        if n < min {
            return Err(SpatialError::malformed(
                at,
                format!("{} has {} points, needs at least {}", what, n, min),
            ));
        }
        (0..n).map(|_| self.read_coord(order)).collect()
    }

    fn read_polygon_body(&mut self, order: ByteOrder) -> Result<Polygon> {
        let at = self.offset();
        let rings = self.read_count(order, 4, "ring")?;
        if rings == 0 {
            return Err(SpatialError::malformed(at, "polygon has no exterior ring"));
        }
        let exterior = self.read_coords(order, MIN_RING_POINTS, "polygon ring")?;
        let interiors = (1..rings)
            .map(|_| self.read_coords(order, MIN_RING_POINTS, "polygon ring"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    /// Read a byte order flag and type code. Returns the base type code.
    fn read_header(&mut self) -> Result<(ByteOrder, u32, Srid)> {
        let at = self.offset();
        self.need(1, "byte order flag")?;
        let flag = self.buf.get_u8();
        let order = ByteOrder::from_flag(flag).ok_or_else(|| {
            SpatialError::malformed(at, format!("invalid byte order flag {:#04x}", flag))
        })?;

        let code_at = self.offset();
        let raw = self.read_u32(order, "type code")?;
        if raw & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 {
            return Err(SpatialError::malformed(
                code_at,
                "Z/M coordinates are not supported; geometries are 2-D",
            ));
        }
        let srid = if raw & EWKB_SRID_FLAG != 0 {
            Some(self.read_i32(order, "srid")?)
        } else {
            None
        };

        let code = raw & !EWKB_FLAGS;
        if code >= 1000 {
            return Err(SpatialError::malformed(
                code_at,
                format!(
                    "type code {} uses ISO Z/M dimensions; geometries are 2-D",
                    code
                ),
            ));
        }
        Ok((order, code, srid))
    }

    fn read_geometry(&mut self, depth: usize) -> Result<(Geometry, Srid)> {
        if depth > MAX_DEPTH {
            return Err(SpatialError::malformed(
                self.offset(),
                format!("geometry nesting exceeds {} levels", MAX_DEPTH),
            ));
        }

        let start = self.offset();
        let (order, code, srid) = self.read_header()?;
        let geometry = match code {
            WKB_POINT => {
                let at = self.offset();
                let c = self.read_raw_coord(order)?;
                if c.x.is_nan() && c.y.is_nan() {
                    return Err(SpatialError::malformed(start, "empty point is not supported"));
                }
                Geometry::Point(finite_at(at, c)?)
            }
            WKB_LINESTRING => {
                Geometry::LineString(self.read_coords(order, MIN_LINE_POINTS, "line string")?)
            }
            WKB_POLYGON => Geometry::Polygon(self.read_polygon_body(order)?),
            WKB_MULTIPOINT => {
                let n = self.read_count(order, 5 + COORD_SIZE, "member")?;
                let mut points = Vec::with_capacity(n);
                for _ in 0..n {
                    let at = self.offset();
                    match self.read_geometry(depth + 1)?.0 {
                        Geometry::Point(c) => points.push(c),
                        other => return Err(member_mismatch(at, "MULTIPOINT", &other)),
                    }
                }
                Geometry::MultiPoint(points)
            }
            WKB_MULTILINESTRING => {
                let n = self.read_count(order, 9, "member")?;
                let mut lines = Vec::with_capacity(n);
                for _ in 0..n {
                    let at = self.offset();
                    match self.read_geometry(depth + 1)?.0 {
                        Geometry::LineString(c) => lines.push(c),
                        other => return Err(member_mismatch(at, "MULTILINESTRING", &other)),
                    }
                }
                Geometry::MultiLineString(lines)
            }
            WKB_MULTIPOLYGON => {
                let n = self.read_count(order, 9, "member")?;
                let mut polys = Vec::with_capacity(n);
                for _ in 0..n {
                    let at = self.offset();
                    match self.read_geometry(depth + 1)?.0 {
                        Geometry::Polygon(p) => polys.push(p),
                        other => return Err(member_mismatch(at, "MULTIPOLYGON", &other)),
                    }
                }
                Geometry::MultiPolygon(polys)
            }
            WKB_GEOMETRYCOLLECTION => {
                let n = self.read_count(order, 5, "member")?;
                let mut children = Vec::with_capacity(n);
                for _ in 0..n {
                    children.push(self.read_geometry(depth + 1)?.0);
                }
                Geometry::GeometryCollection(children)
            }
            other => {
                return Err(SpatialError::malformed(
                    start + 1,
                    format!("unknown geometry type code {}", other),
                ))
            }
        };
        Ok((geometry, srid))
    }
}

fn finite_at(offset: usize, c: Coord) -> Result<Coord> {
    if c.is_finite() {
        Ok(c)
    } else {
        Err(SpatialError::malformed(
            offset,
            format!("coordinate ({}, {}) is not finite", c.x, c.y),
        ))
    }
}

fn member_mismatch(offset: usize, container: &str, found: &Geometry) -> SpatialError {
    SpatialError::malformed(
        offset,
        format!("{} member is a {}", container, found.keyword()),
    )
}
