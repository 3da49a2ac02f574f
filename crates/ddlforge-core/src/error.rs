//! Error types for schema generation and introspection.

/// Errors raised by model validation, SQL generation, and
/// introspection.
#[derive(Debug, thiserror::Error)]
pub enum DdlError {
    /// The schema model is malformed (dangling references, nullable
    /// primary key columns, ambiguous auto-increment).
    #[error("invalid schema model: {0}")]
    Validation(String),

    /// The dialect cannot express the requested construct and has no
    /// emulation path.
    #[error("dialect '{dialect}' cannot express {feature}")]
    UnsupportedFeature {
        /// Dialect name.
        dialect: &'static str,
        /// Description of the unsupported construct.
        feature: String,
    },

    /// A metadata call against the live database failed.
    #[error("could not introspect the live database: {message}")]
    Introspection {
        /// Human-readable description.
        message: String,
        /// Underlying driver error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Deterministic name generation produced an identifier that is
    /// already taken after truncation.
    #[error("generated identifier '{0}' collides with an existing object name")]
    NameCollision(String),
}

impl DdlError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unsupported-feature error.
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            dialect,
            feature: feature.into(),
        }
    }

    /// Wraps a driver error into an introspection error.
    pub fn introspection<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Introspection {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, DdlError>;
