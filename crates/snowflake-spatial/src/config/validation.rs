//! Configuration validation.

use std::collections::HashSet;

use super::DialectConfig;
use crate::core::predicate::PredicateKind;
use crate::dialect::TypeRegistry;
use crate::drivers::DialectImpl;
use crate::error::{Result, SpatialError};

/// Validate the configuration.
pub fn validate(config: &DialectConfig) -> Result<()> {
    let registry = TypeRegistry::with_quote_char(config.quote_char)?;
    DialectImpl::from_db_type(&config.r#type, &registry)?;

    let enabled = parse_kinds("enable_predicates", &config.enable_predicates)?;
    let disabled = parse_kinds("disable_predicates", &config.disable_predicates)?;
    if let Some(kind) = enabled.intersection(&disabled).min() {
        return Err(SpatialError::Config(format!(
            "predicate {} is listed in both enable_predicates and disable_predicates",
            kind
        )));
    }

    Ok(())
}

/// Resolve predicate names, rejecting unknown ones.
pub(super) fn parse_kinds(field: &str, names: &[String]) -> Result<HashSet<PredicateKind>> {
    names
        .iter()
        .map(|name| {
            PredicateKind::from_name(name).ok_or_else(|| {
                SpatialError::Config(format!("{}: unknown predicate kind '{}'", field, name))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&DialectConfig::default()).is_ok());
    }

    #[test]
    fn test_wrong_type() {
        let config = DialectConfig {
            r#type: "postgis".to_string(),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("'postgis'"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_quote_char() {
        let config = DialectConfig {
            quote_char: ' ',
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_predicate() {
        let config = DialectConfig {
            enable_predicates: vec!["touches".into(), "nearest".into()],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("unknown predicate kind 'nearest'"));
    }

    #[test]
    fn test_conflicting_predicate_lists() {
        let config = DialectConfig {
            enable_predicates: vec!["TOUCHES".into()],
            disable_predicates: vec!["touches".into()],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("TOUCHES is listed in both"));
    }
}
