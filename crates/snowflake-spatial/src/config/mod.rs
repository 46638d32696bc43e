//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::core::traits::ScalarQuery;
use crate::dialect::{DialectCapabilities, TypeRegistry};
use crate::drivers::DialectImpl;
use crate::error::Result;
use crate::resolver::SridResolver;

impl DialectConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DialectConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Type registry with the configured quoting and escaping rules.
    pub fn registry(&self) -> Result<TypeRegistry> {
        Ok(TypeRegistry::with_quote_char(self.quote_char)?
            .with_escape_backslash(self.escape_backslash))
    }

    /// Snowflake defaults adjusted by `enable_predicates` and
    /// `disable_predicates`.
    pub fn capabilities(&self) -> Result<DialectCapabilities> {
        let enabled = validation::parse_kinds("enable_predicates", &self.enable_predicates)?;
        let disabled = validation::parse_kinds("disable_predicates", &self.disable_predicates)?;

        let mut caps = DialectCapabilities::snowflake();
        for kind in enabled {
            caps = caps.enable(kind);
        }
        for kind in disabled {
            caps = caps.disable(kind);
        }
        debug!("Dialect supports {} predicate kinds", caps.len());
        Ok(caps)
    }

    /// SQL dialect with the configured quoting and escaping rules.
    pub fn dialect(&self) -> Result<DialectImpl> {
        let registry = self.registry()?;
        DialectImpl::from_db_type(&self.r#type, &registry)
    }

    /// Resolver over `query` using the configured envelope encoding.
    pub fn resolver(&self, query: Arc<dyn ScalarQuery>) -> Result<SridResolver> {
        let registry = self.registry()?;
        Ok(SridResolver::new(query, &registry).with_encoding(self.envelope_encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predicate::PredicateKind;
    use crate::core::traits::Dialect;
    use crate::resolver::EnvelopeEncoding;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = DialectConfig::from_yaml("{}").unwrap();
        assert_eq!(config, DialectConfig::default());
        assert_eq!(config.capabilities().unwrap(), DialectCapabilities::snowflake());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
type: snowflake
quote_char: "`"
envelope_encoding: text
escape_backslash: false
enable_predicates: [touches, overlaps]
disable_predicates: [like]
"#;
        let config = DialectConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.envelope_encoding, EnvelopeEncoding::Text);

        let caps = config.capabilities().unwrap();
        assert!(caps.supports(PredicateKind::Touches));
        assert!(caps.supports(PredicateKind::Overlaps));
        assert!(!caps.supports(PredicateKind::Like));

        let dialect = config.dialect().unwrap();
        assert_eq!(dialect.quote_ident("g").unwrap(), "`g`");
        assert_eq!(dialect.string_literal("a\\b"), "'a\\b'");
    }

    #[test]
    fn test_translate_honors_escape_backslash() {
        use crate::core::predicate::{ComparisonOp, Expr, PredicateNode};
        use crate::translate::translate;

        let node = PredicateNode::compare(
            ComparisonOp::Eq,
            Expr::column("path"),
            Expr::text("C:\\tmp"),
        );
        let config = DialectConfig::from_yaml("escape_backslash: false").unwrap();
        let sql = translate(&node, &config.registry().unwrap(), &config.capabilities().unwrap())
            .unwrap();
        assert_eq!(sql, "\"path\" = 'C:\\tmp'");

        let sql = translate(
            &node,
            &DialectConfig::default().registry().unwrap(),
            &DialectCapabilities::snowflake(),
        )
        .unwrap();
        assert_eq!(sql, "\"path\" = 'C:\\\\tmp'");
    }

    #[test]
    fn test_invalid_yaml_value() {
        let err = DialectConfig::from_yaml("envelope_encoding: hex").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DialectConfig::load("/nonexistent/dialect.yaml").unwrap_err();
        assert!(err.to_string().starts_with("IO error"));
    }
}
