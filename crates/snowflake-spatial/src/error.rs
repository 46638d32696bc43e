//! Error types for the spatial dialect library.

use thiserror::Error;

use crate::core::predicate::PredicateKind;

/// Boxed error returned by a backend query handle.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for codec, translation and resolution operations.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// Binary or text geometry input could not be decoded.
    #[error("Malformed geometry at offset {offset}: {message}")]
    MalformedGeometry { offset: usize, message: String },

    /// A geometry violated an internal invariant while being encoded.
    #[error("Geometry encoding error: {0}")]
    Encoding(String),

    /// Predicate kind is outside the dialect's capability set.
    #[error("Unsupported predicate {kind} in {context}")]
    UnsupportedPredicate { kind: PredicateKind, context: String },

    /// Predicate node is structurally invalid (bad distance, bad literal).
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A backend cell had the wrong scalar type for the value being read.
    #[error("Type mismatch in {context}: expected {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    /// Another error annotated with the operation or predicate path it came from.
    #[error("{context}: {inner}")]
    Context {
        context: String,
        inner: Box<SpatialError>,
    },

    /// Query handle failed while resolving column metadata
    #[error("Backend error during {context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Configuration error (invalid YAML values, bad identifiers, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpatialError {
    /// Create a MalformedGeometry error at the given byte or char offset.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        SpatialError::MalformedGeometry {
            offset,
            message: message.into(),
        }
    }

    /// Wrap a backend failure with context about the operation and column.
    pub fn backend(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SpatialError::Backend {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a TypeMismatch error for a backend value.
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        SpatialError::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Annotate this error with the operation that raised it.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SpatialError::Context {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// The innermost error under any `Context` layers.
    pub fn root_cause(&self) -> &SpatialError {
        match self {
            SpatialError::Context { inner, .. } => inner.root_cause(),
            other => other,
        }
    }

    /// Create an UnsupportedPredicate error.
    pub fn unsupported(kind: PredicateKind, context: impl Into<String>) -> Self {
        SpatialError::UnsupportedPredicate {
            kind,
            context: context.into(),
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SpatialError::Context { inner, .. } => inner.exit_code(),
            SpatialError::Config(_) | SpatialError::Yaml(_) => 2,
            SpatialError::MalformedGeometry { .. } | SpatialError::Encoding(_) => 3,
            SpatialError::UnsupportedPredicate { .. } | SpatialError::InvalidPredicate(_) => 4,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
