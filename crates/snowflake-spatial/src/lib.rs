//! # snowflake-spatial
//!
//! Spatial predicate translation and geometry encoding for Snowflake's
//! GEOMETRY type.
//!
//! This library provides:
//!
//! - **Geometry codec**: WKB and WKT encoding/decoding with offset-carrying errors
//! - **Predicate translation**: filter trees rendered as Snowflake SQL
//! - **Capability negotiation**: check or split filters the dialect cannot express
//! - **Type registry**: geometry type codes/names and scalar type overrides
//! - **SRID resolution**: one scalar lookup per geometry column, optionally cached
//!
//! ## Example
//!
//! ```rust
//! use snowflake_spatial::{
//!     translate, DialectCapabilities, Expr, Geometry, PredicateNode, SpatialKind, TypeRegistry,
//! };
//!
//! let filter = PredicateNode::spatial(
//!     SpatialKind::DWithin(3.0),
//!     Expr::column("geom"),
//!     Expr::geometry(Geometry::point(5.0, 5.0), None),
//! );
//! let sql = translate(
//!     &filter,
//!     &TypeRegistry::snowflake(),
//!     &DialectCapabilities::snowflake(),
//! )
//! .unwrap();
//! assert_eq!(sql, "ST_DISTANCE(\"geom\", ST_GEOMFROMTEXT('POINT(5 5)'))<3.0");
//! ```

pub mod codec;
pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod resolver;
pub mod translate;

// Re-exports for convenient access
pub use codec::{decode_binary, decode_text, encode_binary, encode_text};
pub use config::DialectConfig;
pub use crate::core::{
    ComparisonOp, Coord, Envelope, Expr, Geometry, Literal, Polygon, PredicateKind,
    PredicateNode, ScalarQuery, ScalarValue, SpatialKind, Srid,
};
pub use dialect::{DialectCapabilities, GenericSqlType, GeometryKind, TypeRegistry};
pub use drivers::{DialectImpl, SnowflakeDialect};
pub use error::{Result, SpatialError};
pub use resolver::{CachingResolver, EnvelopeEncoding, EnvelopeValue, SridResolver};
pub use translate::{translate, FilterToSql};
