//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::core::identifier::DEFAULT_QUOTE_CHAR;
use crate::resolver::EnvelopeEncoding;

/// Dialect configuration, usually loaded from `dialect.yaml`.
///
/// ```yaml
/// type: snowflake
/// quote_char: '"'
/// envelope_encoding: binary
/// escape_backslash: true
/// enable_predicates: [touches, equals]
/// disable_predicates: [like]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialectConfig {
    /// Dialect type (always "snowflake" for now).
    #[serde(default = "default_snowflake")]
    pub r#type: String,

    /// Identifier quote character (default: `"`).
    #[serde(default = "default_quote_char")]
    pub quote_char: char,

    /// Encoding of geometry and envelope values returned by the backend.
    #[serde(default)]
    pub envelope_encoding: EnvelopeEncoding,

    /// Double backslashes inside string literals (default: true).
    #[serde(default = "default_true")]
    pub escape_backslash: bool,

    /// Predicate kinds to add to the dialect defaults.
    #[serde(default)]
    pub enable_predicates: Vec<String>,

    /// Predicate kinds to remove from the dialect defaults.
    #[serde(default)]
    pub disable_predicates: Vec<String>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            r#type: default_snowflake(),
            quote_char: default_quote_char(),
            envelope_encoding: EnvelopeEncoding::default(),
            escape_backslash: true,
            enable_predicates: Vec::new(),
            disable_predicates: Vec::new(),
        }
    }
}

fn default_snowflake() -> String {
    "snowflake".to_string()
}

fn default_quote_char() -> char {
    DEFAULT_QUOTE_CHAR
}

fn default_true() -> bool {
    true
}
