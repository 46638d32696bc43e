//! Seams between the core and its collaborators.
//!
//! - [`Dialect`]: SQL syntax strategy (quoting, spatial function names)
//! - [`ScalarQuery`]: one-shot scalar query against a live backend

use async_trait::async_trait;

use crate::core::predicate::SpatialKind;
use crate::error::{BoxError, Result};

use super::value::ScalarValue;

/// SQL syntax strategy for a spatial backend.
///
/// Implementations are immutable after construction and shared across
/// translations.
pub trait Dialect: Send + Sync {
    /// Dialect identifier (e.g., "snowflake").
    fn name(&self) -> &str;

    /// Quote an identifier (column, table, schema).
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Backend function implementing a non-distance spatial predicate.
    fn spatial_function(&self, kind: &SpatialKind) -> &'static str;

    /// Function building a geometry from WKT.
    fn geometry_from_text(&self) -> &'static str;

    /// Function computing the distance between two geometries.
    fn distance_function(&self) -> &'static str;

    /// Suffix turning a boolean spatial function into a comparable scalar.
    ///
    /// Empty when the engine's grammar accepts the bare function call.
    fn boolean_suffix(&self) -> &'static str;

    /// Render a string literal. The default doubles single quotes.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Execute a single scalar query on a backend connection.
///
/// Implemented by the connection layer; the resolver issues exactly one call
/// per lookup and never retries. Errors are surfaced unchanged, wrapped in
/// [`SpatialError::Backend`](crate::error::SpatialError::Backend) by the caller.
#[async_trait]
pub trait ScalarQuery: Send + Sync {
    /// Run `sql` and return the first column of the first row, or `None`
    /// when the result set is empty.
    async fn query_scalar(&self, sql: &str) -> std::result::Result<Option<ScalarValue>, BoxError>;
}
