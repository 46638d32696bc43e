//! Snowflake SQL dialect (Strategy pattern).
//!
//! Spatial function names, the boolean comparison suffix and literal
//! escaping for Snowflake's GEOMETRY functions.

use crate::core::identifier::{self, DEFAULT_QUOTE_CHAR};
use crate::core::predicate::SpatialKind;
use crate::core::traits::Dialect;
use crate::dialect::TypeRegistry;
use crate::error::Result;

/// Snowflake dialect implementation.
#[derive(Debug, Clone, Copy)]
pub struct SnowflakeDialect {
    quote_char: char,
    escape_backslash: bool,
}

impl Default for SnowflakeDialect {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_CHAR)
    }
}

impl SnowflakeDialect {
    /// Create a dialect quoting identifiers with `quote_char`. Backslashes in
    /// string literals are escaped, since Snowflake treats `\` as an escape
    /// character.
    pub fn new(quote_char: char) -> Self {
        Self {
            quote_char,
            escape_backslash: true,
        }
    }

    /// Dialect using the registry's quoting and escaping rules.
    pub fn from_registry(registry: &TypeRegistry) -> Self {
        Self::new(registry.quote_char()).with_escape_backslash(registry.escape_backslash())
    }

    pub fn with_escape_backslash(mut self, escape: bool) -> Self {
        self.escape_backslash = escape;
        self
    }
}

impl Dialect for SnowflakeDialect {
    fn name(&self) -> &str {
        "snowflake"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        identifier::quote_with(self.quote_char, name)
    }

    fn spatial_function(&self, kind: &SpatialKind) -> &'static str {
        match kind {
            SpatialKind::Contains => "ST_CONTAINS",
            // No crosses predicate in Snowflake
            SpatialKind::BBox | SpatialKind::Crosses | SpatialKind::Intersects => "ST_INTERSECTS",
            SpatialKind::Disjoint => "ST_DISJOINT",
            SpatialKind::Equals => "ST_EQUALS",
            SpatialKind::Overlaps => "ST_OVERLAPS",
            SpatialKind::Touches => "ST_TOUCHES",
            SpatialKind::Within => "ST_WITHIN",
            SpatialKind::DWithin(_) | SpatialKind::Beyond(_) => "ST_DISTANCE",
        }
    }

    fn geometry_from_text(&self) -> &'static str {
        "ST_GEOMFROMTEXT"
    }

    fn distance_function(&self) -> &'static str {
        "ST_DISTANCE"
    }

    fn boolean_suffix(&self) -> &'static str {
        " = 1"
    }

    fn string_literal(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' if self.escape_backslash => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}
