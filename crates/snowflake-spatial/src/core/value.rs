//! Scalar values returned by a backend query handle.

use std::fmt;

/// A single scalar cell as returned by [`ScalarQuery`](super::traits::ScalarQuery).
///
/// Drivers convert their native row types into this enum; the resolver only
/// needs integers (SRID), binary (WKB envelopes) and text (WKT envelopes).
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Interpret the value as an `i32`, accepting integral floats and numeric
    /// text since some drivers return `NUMBER` columns as either.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ScalarValue::Int(v) => i32::try_from(*v).ok(),
            ScalarValue::Float(v) if v.fract() == 0.0 => {
                if *v >= i32::MIN as f64 && *v <= i32::MAX as f64 {
                    Some(*v as i32)
                } else {
                    None
                }
            }
            ScalarValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short type label for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "NULL",
            ScalarValue::Int(_) => "integer",
            ScalarValue::Float(_) => "float",
            ScalarValue::Text(_) => "text",
            ScalarValue::Bytes(_) => "binary",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Text(s) => write!(f, "{:?}", s),
            ScalarValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}
