//! Database driver implementations.
//!
//! Each driver module implements [`Dialect`] for one engine. Connection
//! handling lives outside this crate; drivers only describe SQL syntax.
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement the `Dialect` trait
//! 3. Add an enum variant to `DialectImpl` and a name in `from_db_type`

pub mod snowflake;

pub use snowflake::SnowflakeDialect;

use crate::core::predicate::SpatialKind;
use crate::core::traits::Dialect;
use crate::dialect::TypeRegistry;
use crate::error::{Result, SpatialError};

/// Enum-based static dispatch for dialects.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Snowflake(SnowflakeDialect),
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Snowflake(d) => d.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            DialectImpl::Snowflake(d) => d.quote_ident(name),
        }
    }

    fn spatial_function(&self, kind: &SpatialKind) -> &'static str {
        match self {
            DialectImpl::Snowflake(d) => d.spatial_function(kind),
        }
    }

    fn geometry_from_text(&self) -> &'static str {
        match self {
            DialectImpl::Snowflake(d) => d.geometry_from_text(),
        }
    }

    fn distance_function(&self) -> &'static str {
        match self {
            DialectImpl::Snowflake(d) => d.distance_function(),
        }
    }

    fn boolean_suffix(&self) -> &'static str {
        match self {
            DialectImpl::Snowflake(d) => d.boolean_suffix(),
        }
    }

    fn string_literal(&self, value: &str) -> String {
        match self {
            DialectImpl::Snowflake(d) => d.string_literal(value),
        }
    }
}

impl DialectImpl {
    /// Create a dialect from a database type string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str, registry: &TypeRegistry) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "snowflake" | "sf" => Ok(DialectImpl::Snowflake(SnowflakeDialect::from_registry(registry))),
            other => Err(SpatialError::Config(format!(
                "Unknown database type: '{}'. Supported types: snowflake",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_impl_from_db_type() {
        let registry = TypeRegistry::snowflake();
        let dialect = DialectImpl::from_db_type("Snowflake", &registry).unwrap();
        assert_eq!(dialect.name(), "snowflake");
        assert_eq!(dialect.quote_ident("geom").unwrap(), "\"geom\"");
        assert_eq!(dialect.boolean_suffix(), " = 1");

        assert!(DialectImpl::from_db_type("postgres", &registry).is_err());
    }
}
