//! Well-known text geometry encoding.
//!
//! Output is canonical: upper-case keywords, no space before the opening
//! parenthesis, `", "` between coordinates and members, and floats in their
//! shortest round-trip form (`POINT(5 5)`, `POINT(0.1 -2.5)`).
//!
//! Input is lenient about whitespace and keyword case, accepts both
//! `MULTIPOINT((1 2), (3 4))` and `MULTIPOINT(1 2, 3 4)`, and an optional
//! EWKT `SRID=n;` prefix.

use std::fmt::Write;

use super::{validate, MAX_DEPTH, MIN_LINE_POINTS, MIN_RING_POINTS};
use crate::core::geometry::{Coord, Geometry, Polygon, Srid};
use crate::error::{Result, SpatialError};

/// Encode a geometry as canonical WKT.
pub fn encode_text(geometry: &Geometry) -> Result<String> {
    validate(geometry)?;
    let mut out = String::new();
    write_geometry(&mut out, geometry);
    Ok(out)
}

fn write_coord(out: &mut String, c: &Coord) {
    // Writing to a String cannot fail.
    let _ = write!(out, "{} {}", c.x, c.y);
}

fn write_coord_seq(out: &mut String, coords: &[Coord]) {
    out.push('(');
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coord(out, c);
    }
    out.push(')');
}

fn write_polygon_body(out: &mut String, polygon: &Polygon) {
    out.push('(');
    for (i, ring) in polygon.rings().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coord_seq(out, ring);
    }
    out.push(')');
}

fn write_members<T>(out: &mut String, members: &[T], mut each: impl FnMut(&mut String, &T)) {
    if members.is_empty() {
        out.push_str(" EMPTY");
        return;
    }
    out.push('(');
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        each(out, m);
    }
    out.push(')');
}

fn write_geometry(out: &mut String, geometry: &Geometry) {
    out.push_str(geometry.keyword());
    match geometry {
        Geometry::Point(c) => {
            out.push('(');
            write_coord(out, c);
            out.push(')');
        }
        Geometry::LineString(coords) | Geometry::LinearRing(coords) => {
            write_coord_seq(out, coords)
        }
        Geometry::Polygon(p) => write_polygon_body(out, p),
        Geometry::MultiPoint(points) => write_members(out, points, |out, c| {
            out.push('(');
            write_coord(out, c);
            out.push(')');
        }),
        Geometry::MultiLineString(lines) => {
            write_members(out, lines, |out, l| write_coord_seq(out, l))
        }
        Geometry::MultiPolygon(polys) => {
            write_members(out, polys, |out, p| write_polygon_body(out, p))
        }
        Geometry::GeometryCollection(children) => write_members(out, children, write_geometry),
    }
}

/// Decode WKT (or EWKT), discarding any `SRID=n;` prefix.
pub fn decode_text(text: &str) -> Result<Geometry> {
    decode_text_with_srid(text).map(|(geometry, _)| geometry)
}

/// Decode WKT, returning the SRID from an EWKT `SRID=n;` prefix if present.
pub fn decode_text_with_srid(text: &str) -> Result<(Geometry, Srid)> {
    let mut parser = WktParser::new(text);
    parser.skip_ws();
    let srid = parser.srid_prefix()?;
    let geometry = parser.geometry(0)?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error_here("unexpected trailing characters"));
    }
    Ok((geometry, srid))
}

/// Recursive-descent parser over the input bytes.
///
/// Positions are byte indexes internally; errors convert them to character
/// offsets so non-ASCII input reports where a human would count.
struct WktParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WktParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn char_offset(&self, byte_pos: usize) -> usize {
        let mut end = byte_pos.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        self.text[..end].chars().count()
    }

    fn error_at(&self, byte_pos: usize, message: impl Into<String>) -> SpatialError {
        SpatialError::malformed(self.char_offset(byte_pos), message)
    }

    fn error_here(&self, message: impl Into<String>) -> SpatialError {
        self.error_at(self.pos, message)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error_here(format!("expected '{}'", byte as char))),
            None => Err(self.error_here(format!(
                "expected '{}' but input ended",
                byte as char
            ))),
        }
    }

    /// Consume `byte` if it is the next non-whitespace character.
    fn consume(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Read an alphabetic word, upper-cased. Returns an empty string if the
    /// next character is not a letter.
    fn word(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic() || b == b'_') {
            self.pos += 1;
        }
        self.text[start..self.pos].to_ascii_uppercase()
    }

    fn srid_prefix(&mut self) -> Result<Srid> {
        let start = self.pos;
        if self.word() != "SRID" {
            self.pos = start;
            return Ok(None);
        }
        self.expect(b'=')?;
        self.skip_ws();
        let num_start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let srid = self.text[num_start..self.pos]
            .parse::<i32>()
            .map_err(|_| self.error_at(num_start, "invalid SRID value"))?;
        self.expect(b';')?;
        Ok(Some(srid))
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error_here("expected number"));
        }
        let value = self.text[start..self.pos]
            .parse::<f64>()
            .map_err(|_| self.error_at(start, format!("invalid number '{}'", &self.text[start..self.pos])))?;
        if !value.is_finite() {
            return Err(self.error_at(start, "coordinate is not finite"));
        }
        Ok(value)
    }

    fn coord(&mut self) -> Result<Coord> {
        let x = self.number()?;
        let y = self.number()?;
        self.skip_ws();
        if matches!(self.peek(), Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.')
        {
            return Err(self.error_here("only 2-D coordinates are supported"));
        }
        Ok(Coord::new(x, y))
    }

    /// `(x y, x y, ...)` with at least `min` coordinates.
    fn coord_seq(&mut self, min: usize, what: &str) -> Result<Vec<Coord>> {
        self.skip_ws();
        let start = self.pos;
        self.expect(b'(')?;
        let mut coords = vec![self.coord()?];
        while self.consume(b',') {
            coords.push(self.coord()?);
        }
        self.expect(b')')?;
        if coords.len() < min {
            return Err(self.error_at(
                start,
                format!("{} has {} points, needs at least {}", what, coords.len(), min),
            ));
        }
        Ok(coords)
    }

    fn polygon_body(&mut self) -> Result<Polygon> {
        self.expect(b'(')?;
        let exterior = self.coord_seq(MIN_RING_POINTS, "polygon ring")?;
        let mut interiors = Vec::new();
        while self.consume(b',') {
            interiors.push(self.coord_seq(MIN_RING_POINTS, "polygon ring")?);
        }
        self.expect(b')')?;
        Ok(Polygon::new(exterior, interiors))
    }

    /// Parse a comma-separated parenthesized list, or `EMPTY`.
    fn members<T>(&mut self, mut each: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.expect(b'(')?;
        let mut out = vec![each(self)?];
        while self.consume(b',') {
            out.push(each(self)?);
        }
        self.expect(b')')?;
        Ok(out)
    }

    fn multipoint_member(&mut self) -> Result<Coord> {
        if self.consume(b'(') {
            let c = self.coord()?;
            self.expect(b')')?;
            Ok(c)
        } else {
            self.coord()
        }
    }

    /// Check for `EMPTY` or a dimension qualifier after the keyword.
    /// Returns true when the geometry is empty.
    fn modifier(&mut self, keyword: &str, start: usize) -> Result<bool> {
        let at = self.pos;
        match self.word().as_str() {
            "" => Ok(false),
            "EMPTY" => Ok(true),
            "Z" | "M" | "ZM" => Err(self.error_at(at, "only 2-D coordinates are supported")),
            other => Err(self.error_at(
                start,
                format!("unexpected '{}' after {}", other, keyword),
            )),
        }
    }

    fn geometry(&mut self, depth: usize) -> Result<Geometry> {
        if depth > MAX_DEPTH {
            return Err(self.error_here(format!("geometry nesting exceeds {} levels", MAX_DEPTH)));
        }
        self.skip_ws();
        let start = self.pos;
        let keyword = self.word();
        if keyword.is_empty() {
            return Err(self.error_here("expected geometry keyword"));
        }
        let empty = self.modifier(&keyword, start)?;

        let geometry = match keyword.as_str() {
            "POINT" | "LINESTRING" | "POLYGON" if empty => {
                return Err(self.error_at(start, format!("{} EMPTY is not supported", keyword)))
            }
            "MULTIPOINT" if empty => Geometry::MultiPoint(Vec::new()),
            "MULTILINESTRING" if empty => Geometry::MultiLineString(Vec::new()),
            "MULTIPOLYGON" if empty => Geometry::MultiPolygon(Vec::new()),
            "GEOMETRYCOLLECTION" if empty => Geometry::GeometryCollection(Vec::new()),
            "POINT" => {
                self.expect(b'(')?;
                let c = self.coord()?;
                self.expect(b')')?;
                Geometry::Point(c)
            }
            "LINESTRING" => Geometry::LineString(self.coord_seq(MIN_LINE_POINTS, "line string")?),
            "POLYGON" => Geometry::Polygon(self.polygon_body()?),
            "MULTIPOINT" => Geometry::MultiPoint(self.members(Self::multipoint_member)?),
            "MULTILINESTRING" => Geometry::MultiLineString(
                self.members(|p| p.coord_seq(MIN_LINE_POINTS, "line string"))?,
            ),
            "MULTIPOLYGON" => Geometry::MultiPolygon(self.members(Self::polygon_body)?),
            "GEOMETRYCOLLECTION" => {
                Geometry::GeometryCollection(self.members(|p| p.geometry(depth + 1))?)
            }
            other => {
                return Err(self.error_at(start, format!("unknown geometry keyword '{}'", other)))
            }
        };
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(err: SpatialError) -> usize {
        match err {
            SpatialError::MalformedGeometry { offset, .. } => offset,
            other => panic!("expected malformed geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_output() {
        assert_eq!(encode_text(&Geometry::point(5.0, 5.0)).unwrap(), "POINT(5 5)");
        let square = Geometry::polygon_from(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        assert_eq!(
            encode_text(&square).unwrap(),
            "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))"
        );
        let mp = Geometry::MultiPoint(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)]);
        assert_eq!(encode_text(&mp).unwrap(), "MULTIPOINT((1 2), (3 4))");
    }

    #[test]
    fn test_fractional_and_negative_coords() {
        let p = Geometry::point(0.1, -122.4194155);
        let text = encode_text(&p).unwrap();
        assert_eq!(text, "POINT(0.1 -122.4194155)");
        assert_eq!(decode_text(&text).unwrap(), p);
    }

    #[test]
    fn test_empty_members() {
        assert_eq!(
            encode_text(&Geometry::GeometryCollection(vec![])).unwrap(),
            "GEOMETRYCOLLECTION EMPTY"
        );
        assert_eq!(
            decode_text("multipolygon empty").unwrap(),
            Geometry::MultiPolygon(vec![])
        );
    }

    #[test]
    fn test_nested_collection() {
        let gc = Geometry::GeometryCollection(vec![
            Geometry::point(1.0, 2.0),
            Geometry::line_from(&[(0.0, 0.0), (3.0, 3.0)]),
            Geometry::MultiLineString(vec![]),
        ]);
        let text = encode_text(&gc).unwrap();
        assert_eq!(
            text,
            "GEOMETRYCOLLECTION(POINT(1 2), LINESTRING(0 0, 3 3), MULTILINESTRING EMPTY)"
        );
        assert_eq!(decode_text(&text).unwrap(), gc);
    }

    #[test]
    fn test_lenient_input() {
        let decoded = decode_text("  point ( 1.5   2 ) ").unwrap();
        assert_eq!(decoded, Geometry::point(1.5, 2.0));

        let bare = decode_text("MULTIPOINT(1 2, 3 4)").unwrap();
        let wrapped = decode_text("MULTIPOINT((1 2),(3 4))").unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_ewkt_prefix() {
        let (geometry, srid) = decode_text_with_srid("SRID=4326;POINT(1 2)").unwrap();
        assert_eq!(geometry, Geometry::point(1.0, 2.0));
        assert_eq!(srid, Some(4326));
        assert_eq!(decode_text_with_srid("POINT(1 2)").unwrap().1, None);
    }

    #[test]
    fn test_error_offsets() {
        assert_eq!(offset_of(decode_text("POINT(1 x)").unwrap_err()), 8);
        assert_eq!(offset_of(decode_text("CIRCLE(1 2)").unwrap_err()), 0);
        assert_eq!(offset_of(decode_text("POINT(1 2) junk").unwrap_err()), 11);
        assert_eq!(offset_of(decode_text("LINESTRING(0 0)").unwrap_err()), 10);
    }

    #[test]
    fn test_offset_counts_characters() {
        // "é" is two bytes but one character
        let err = decode_text("POINT(1 2)é").unwrap_err();
        assert_eq!(offset_of(err), 10);
        let err = decode_text("é").unwrap_err();
        assert_eq!(offset_of(err), 0);
    }

    #[test]
    fn test_rejects_short_ring() {
        let err = decode_text("POLYGON((0 0, 1 0, 0 0))").unwrap_err();
        assert_eq!(offset_of(err), 8);
    }

    #[test]
    fn test_rejects_3d() {
        assert!(decode_text("POINT Z (1 2 3)").is_err());
        let err = decode_text("POINT(1 2 3)").unwrap_err();
        assert!(err.to_string().contains("2-D"));
    }

    #[test]
    fn test_rejects_empty_point() {
        assert!(decode_text("POINT EMPTY").is_err());
    }

    #[test]
    fn test_unclosed_paren() {
        let err = decode_text("LINESTRING(0 0, 1 1").unwrap_err();
        assert!(err.to_string().contains("input ended"));
        assert_eq!(offset_of(err), 19);
    }
}
