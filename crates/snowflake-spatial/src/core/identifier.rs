//! Identifier validation and quoting.
//!
//! Column, table and schema names cannot be bound as parameters, so they are
//! spliced into SQL text. Every name goes through [`validate_identifier`]
//! before it is wrapped in the dialect's quote character.
//!
//! Embedded quote characters are not escaped. Names coming from the catalog
//! are trusted; a name containing the quote character is logged at `warn` so
//! the caller can see where a rendered fragment may break.

use tracing::warn;

use crate::error::{Result, SpatialError};

/// Maximum identifier length in bytes (Snowflake's documented limit).
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Default quote character for Snowflake identifiers.
pub const DEFAULT_QUOTE_CHAR: char = '"';

/// Validate an identifier before it is placed in SQL text.
///
/// Rejects empty names, names containing NUL bytes, and names longer than
/// [`MAX_IDENTIFIER_LENGTH`] bytes.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SpatialError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(SpatialError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SpatialError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Wrap a validated identifier in `quote`.
///
/// ```ignore
/// assert_eq!(quote_with('"', "geom")?, "\"geom\"");
/// ```
pub fn quote_with(quote: char, name: &str) -> Result<String> {
    validate_identifier(name)?;
    if name.contains(quote) {
        warn!(
            "Identifier {:?} contains quote character '{}' which is not escaped",
            name, quote
        );
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    out.push_str(name);
    out.push(quote);
    Ok(out)
}

/// Qualify a table name with its schema: `"schema"."table"`.
pub fn qualify_with(quote: char, schema: &str, table: &str) -> Result<String> {
    Ok(format!(
        "{}.{}",
        quote_with(quote, schema)?,
        quote_with(quote, table)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("GEOM").is_ok());
        assert!(validate_identifier("road segments").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let err = validate_identifier("").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("geo\0m").unwrap_err();
        assert!(err.to_string().contains("null byte"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_validate_identifier_length_limit() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_quote_default_and_custom() {
        assert_eq!(quote_with('"', "geom").unwrap(), "\"geom\"");
        assert_eq!(quote_with('`', "geom").unwrap(), "`geom`");
    }

    #[test]
    fn test_embedded_quote_is_not_escaped() {
        assert_eq!(quote_with('"', "a\"b").unwrap(), "\"a\"b\"");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(
            qualify_with('"', "PUBLIC", "ROADS").unwrap(),
            "\"PUBLIC\".\"ROADS\""
        );
        assert!(qualify_with('"', "", "ROADS").is_err());
    }
}
