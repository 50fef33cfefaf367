//! Error types for the rule engine

use thiserror::Error;

/// Error produced by a predicate block. Carried unchanged through the engine.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Rule engine errors
#[derive(Debug, Error)]
pub enum AbilityError {
    /// Rule or alias declarations that cannot be evaluated as requested
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Raised by `authorize` when the check fails
    #[error("{message}")]
    AccessDenied {
        /// Action that was checked
        action: String,
        /// Display name of the subject that was checked
        subject: String,
        /// Resolved unauthorized message
        message: String,
    },

    /// A predicate block failed while being evaluated
    #[error("Predicate failed: {0}")]
    Predicate(#[source] PredicateError),

    /// Malformed rule document
    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AbilityError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this error is an access denial from `authorize`
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

/// Result type for rule engine operations
pub type Result<T> = std::result::Result<T, AbilityError>;
