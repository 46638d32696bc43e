//! Geometry type registry for the Snowflake dialect.
//!
//! Maps between [`GeometryKind`] and the dialect's numeric type codes and
//! type names. All lookup tables are populated from [`GEOMETRY_TYPES`] so they
//! cannot drift apart.

use std::collections::HashMap;
use std::fmt;

use crate::core::geometry::Geometry;
use crate::core::identifier::{self, DEFAULT_QUOTE_CHAR};
use crate::error::{Result, SpatialError};

/// Geometry type as known to the dialect.
///
/// `Geometry` is the untyped column type; `Geography` is kept distinct so a
/// geography column never maps back to a geometry code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    Geometry,
    GeometryCollection,
    Geography,
}

/// `(kind, code, canonical name)` for every geometry type.
pub const GEOMETRY_TYPES: [(GeometryKind, i32, &str); 9] = [
    (GeometryKind::Point, 0, "POINT"),
    (GeometryKind::MultiPoint, 1, "MULTIPOINT"),
    (GeometryKind::LineString, 2, "LINESTRING"),
    (GeometryKind::MultiLineString, 3, "MULTILINESTRING"),
    (GeometryKind::Polygon, 4, "POLYGON"),
    (GeometryKind::MultiPolygon, 5, "MULTIPOLYGON"),
    (GeometryKind::Geometry, 6, "GEOMETRY"),
    (GeometryKind::GeometryCollection, 7, "GEOMETRYCOLLECTION"),
    (GeometryKind::Geography, 8, "GEOGRAPHY"),
];

/// Extra spellings accepted by [`TypeRegistry::name_to_kind`].
const NAME_ALIASES: [(&str, GeometryKind); 1] =
    [("GEOMETRY_COLLECTION", GeometryKind::GeometryCollection)];

impl GeometryKind {
    /// Registry kind of a geometry value. Standalone rings report
    /// `LineString`.
    pub fn of(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) | Geometry::LinearRing(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = GEOMETRY_TYPES
            .iter()
            .find(|(k, _, _)| k == self)
            .map(|(_, _, n)| *n)
            .unwrap_or("GEOMETRY");
        f.write_str(name)
    }
}

/// Generic SQL types that a dialect may spell differently in DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericSqlType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Varchar,
    Clob,
    Blob,
    Date,
    Timestamp,
}

impl GenericSqlType {
    /// Name used when the dialect has no override.
    pub fn default_name(&self) -> &'static str {
        match self {
            GenericSqlType::Boolean => "BIT",
            GenericSqlType::SmallInt => "SMALLINT",
            GenericSqlType::Integer => "INTEGER",
            GenericSqlType::BigInt => "BIGINT",
            GenericSqlType::Real => "REAL",
            GenericSqlType::Double => "DOUBLE PRECISION",
            GenericSqlType::Varchar => "VARCHAR",
            GenericSqlType::Clob => "CLOB",
            GenericSqlType::Blob => "BLOB",
            GenericSqlType::Date => "DATE",
            GenericSqlType::Timestamp => "TIMESTAMP",
        }
    }
}

const SNOWFLAKE_OVERRIDES: [(GenericSqlType, &str); 2] = [
    (GenericSqlType::Boolean, "BOOLEAN"),
    (GenericSqlType::Clob, "STRING"),
];

/// Immutable geometry type tables, scalar type overrides and the quoting and
/// string escaping rules.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    quote_char: char,
    escape_backslash: bool,
    kind_to_code: HashMap<GeometryKind, i32>,
    code_to_kind: HashMap<i32, GeometryKind>,
    kind_to_name: HashMap<GeometryKind, &'static str>,
    name_to_kind: HashMap<String, GeometryKind>,
    overrides: HashMap<GenericSqlType, &'static str>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::build(DEFAULT_QUOTE_CHAR)
    }
}

impl TypeRegistry {
    /// Snowflake registry with the default `"` quote character.
    pub fn snowflake() -> Self {
        Self::default()
    }

    /// Snowflake registry with a custom identifier quote character.
    pub fn with_quote_char(quote_char: char) -> Result<Self> {
        if quote_char.is_alphanumeric() || quote_char.is_whitespace() || quote_char == '\'' {
            return Err(SpatialError::Config(format!(
                "Invalid identifier quote character {:?}",
                quote_char
            )));
        }
        Ok(Self::build(quote_char))
    }

    fn build(quote_char: char) -> Self {
        let mut kind_to_code = HashMap::new();
        let mut code_to_kind = HashMap::new();
        let mut kind_to_name = HashMap::new();
        let mut name_to_kind = HashMap::new();

        for (kind, code, name) in GEOMETRY_TYPES {
            kind_to_code.insert(kind, code);
            code_to_kind.insert(code, kind);
            kind_to_name.insert(kind, name);
            name_to_kind.insert(name.to_string(), kind);
        }
        for (alias, kind) in NAME_ALIASES {
            name_to_kind.insert(alias.to_string(), kind);
        }

        Self {
            quote_char,
            escape_backslash: true,
            kind_to_code,
            code_to_kind,
            kind_to_name,
            name_to_kind,
            overrides: SNOWFLAKE_OVERRIDES.into_iter().collect(),
        }
    }

    /// Whether `\` in string literals is doubled. On by default.
    pub fn with_escape_backslash(mut self, escape: bool) -> Self {
        self.escape_backslash = escape;
        self
    }

    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    pub fn escape_backslash(&self) -> bool {
        self.escape_backslash
    }

    /// Quote an identifier with the configured quote character.
    pub fn quote_ident(&self, name: &str) -> Result<String> {
        identifier::quote_with(self.quote_char, name)
    }

    pub fn kind_to_code(&self, kind: GeometryKind) -> Option<i32> {
        self.kind_to_code.get(&kind).copied()
    }

    pub fn code_to_kind(&self, code: i32) -> Option<GeometryKind> {
        self.code_to_kind.get(&code).copied()
    }

    pub fn kind_to_name(&self, kind: GeometryKind) -> Option<&'static str> {
        self.kind_to_name.get(&kind).copied()
    }

    /// Case-insensitive lookup of a column type name.
    pub fn name_to_kind(&self, name: &str) -> Option<GeometryKind> {
        self.name_to_kind.get(&name.trim().to_uppercase()).copied()
    }

    /// Dialect-specific spelling of a generic type, if any.
    pub fn override_sql_type_name(&self, generic: GenericSqlType) -> Option<&'static str> {
        self.overrides.get(&generic).copied()
    }

    /// Override if present, otherwise the generic default.
    pub fn sql_type_name(&self, generic: GenericSqlType) -> &'static str {
        self.override_sql_type_name(generic)
            .unwrap_or_else(|| generic.default_name())
    }
}
