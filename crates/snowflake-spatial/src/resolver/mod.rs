//! Geometry column metadata: SRID lookup, envelope and value decoding.
//!
//! [`SridResolver`] is the only component that talks to a backend. It issues
//! one scalar query per lookup through a caller-supplied [`ScalarQuery`]
//! handle and never retries. [`CachingResolver`] wraps it with a per-column
//! SRID cache that the caller invalidates when a schema changes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codec::{wkb, wkt};
use crate::core::geometry::{Envelope, Geometry, Srid};
use crate::core::identifier;
use crate::core::traits::ScalarQuery;
use crate::core::value::ScalarValue;
use crate::dialect::TypeRegistry;
use crate::error::{Result, SpatialError};

/// Coordinate dimension of every geometry column.
pub const GEOMETRY_DIMENSION: u32 = 2;

/// How the backend returns geometry and envelope values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeEncoding {
    /// `ST_ASWKB(..)`
    #[default]
    Binary,
    /// `ST_ASWKT(..)`
    Text,
}

impl EnvelopeEncoding {
    fn output_function(&self) -> &'static str {
        match self {
            EnvelopeEncoding::Binary => "ST_ASWKB",
            EnvelopeEncoding::Text => "ST_ASWKT",
        }
    }
}

/// Raw envelope or geometry value as fetched from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeValue {
    Binary(Vec<u8>),
    Text(String),
}

impl EnvelopeValue {
    /// Convert a scalar cell. `NULL` yields `None`.
    pub fn from_scalar(value: ScalarValue) -> Result<Option<Self>> {
        match value {
            ScalarValue::Null => Ok(None),
            ScalarValue::Bytes(b) => Ok(Some(EnvelopeValue::Binary(b))),
            ScalarValue::Text(s) => Ok(Some(EnvelopeValue::Text(s))),
            other => Err(SpatialError::type_mismatch(
                "geometry cell",
                "binary or text",
                other.type_name(),
            )),
        }
    }

    fn decode(&self) -> Result<Geometry> {
        match self {
            EnvelopeValue::Binary(bytes) => wkb::decode_binary(bytes),
            EnvelopeValue::Text(text) => wkt::decode_text(text),
        }
    }
}

/// Column metadata resolver for one backend connection.
pub struct SridResolver {
    query: Arc<dyn ScalarQuery>,
    quote_char: char,
    encoding: EnvelopeEncoding,
}

impl SridResolver {
    pub fn new(query: Arc<dyn ScalarQuery>, registry: &TypeRegistry) -> Self {
        Self {
            query,
            quote_char: registry.quote_char(),
            encoding: EnvelopeEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EnvelopeEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> EnvelopeEncoding {
        self.encoding
    }

    fn quote(&self, name: &str) -> Result<String> {
        identifier::quote_with(self.quote_char, name)
    }

    /// `SELECT ST_SRID("col") FROM "schema"."table" WHERE "col" IS NOT NULL LIMIT 1`
    pub fn srid_sql(&self, schema: &str, table: &str, column: &str) -> Result<String> {
        let col = self.quote(column)?;
        let from = identifier::qualify_with(self.quote_char, schema, table)?;
        Ok(format!(
            "SELECT ST_SRID({col}) FROM {from} WHERE {col} IS NOT NULL LIMIT 1",
            col = col,
            from = from
        ))
    }

    /// Select expression returning a geometry column in the configured encoding.
    pub fn geometry_column_sql(&self, column: &str) -> Result<String> {
        Ok(format!(
            "{}({})",
            self.encoding.output_function(),
            self.quote(column)?
        ))
    }

    /// Select expression returning the envelope of a geometry column.
    pub fn envelope_sql(&self, column: &str) -> Result<String> {
        Ok(format!(
            "{}(ST_ENVELOPE({}))",
            self.encoding.output_function(),
            self.quote(column)?
        ))
    }

    /// Look up the SRID of a geometry column from its first non-null row.
    ///
    /// Returns `Ok(None)` when the column has no non-null rows.
    pub async fn resolve_srid(&self, schema: &str, table: &str, column: &str) -> Result<Srid> {
        let sql = self.srid_sql(schema, table, column)?;
        let context = format!("resolve_srid on {}.{}.{}", schema, table, column);
        debug!("{}: {}", context, sql);

        let value = self
            .query
            .query_scalar(&sql)
            .await
            .map_err(|e| SpatialError::backend(context.clone(), e))?;

        match value {
            None | Some(ScalarValue::Null) => {
                debug!("{}: no non-null rows, SRID unknown", context);
                Ok(None)
            }
            Some(v) => match v.as_i32() {
                Some(srid) => Ok(Some(srid)),
                None => Err(SpatialError::backend(
                    context,
                    format!("ST_SRID returned non-integer {} value {}", v.type_name(), v),
                )),
            },
        }
    }

    /// Decode an envelope value into its bounds. Empty geometries have no
    /// envelope.
    pub fn decode_envelope(&self, value: &EnvelopeValue) -> Result<Option<Envelope>> {
        let expected = matches!(
            (self.encoding, value),
            (EnvelopeEncoding::Binary, EnvelopeValue::Binary(_))
                | (EnvelopeEncoding::Text, EnvelopeValue::Text(_))
        );
        if !expected {
            warn!(
                "Envelope value does not match configured {:?} encoding, decoding anyway",
                self.encoding
            );
        }
        let geometry = value
            .decode()
            .map_err(|e| e.with_context(format!("decode_envelope ({:?} value)", self.encoding)))?;
        Ok(geometry.envelope())
    }

    /// Decode a geometry column value. `NULL` yields `None`.
    pub fn decode_geometry_value(&self, value: ScalarValue) -> Result<Option<Geometry>> {
        let decoded = match EnvelopeValue::from_scalar(value) {
            Ok(Some(v)) => v.decode().map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        decoded.map_err(|e| e.with_context("decode_geometry_value"))
    }

    /// Coordinate dimension of a geometry column. Always 2.
    pub fn dimension(&self, _schema: &str, _table: &str, _column: &str) -> u32 {
        GEOMETRY_DIMENSION
    }
}

type ColumnKey = (String, String, String);

/// [`SridResolver`] with a per-column SRID cache.
///
/// Unknown SRIDs are cached too, so an empty column is not re-queried until
/// its table is invalidated.
pub struct CachingResolver {
    inner: SridResolver,
    cache: Mutex<HashMap<ColumnKey, Srid>>,
}

impl CachingResolver {
    pub fn new(inner: SridResolver) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &SridResolver {
        &self.inner
    }

    pub async fn resolve_srid(&self, schema: &str, table: &str, column: &str) -> Result<Srid> {
        let key = (schema.to_string(), table.to_string(), column.to_string());
        if let Some(srid) = self.cache.lock().await.get(&key) {
            return Ok(*srid);
        }

        // Lock is not held across the backend round trip.
        let srid = self.inner.resolve_srid(schema, table, column).await?;
        self.cache.lock().await.insert(key, srid);
        Ok(srid)
    }

    /// Drop cached entries for one table after a schema change.
    pub async fn invalidate_table(&self, schema: &str, table: &str) {
        let mut cache = self.cache.lock().await;
        let before = cache.len();
        cache.retain(|(s, t, _), _| !(s == schema && t == table));
        debug!(
            "Invalidated {} cached SRIDs for {}.{}",
            before - cache.len(),
            schema,
            table
        );
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}
