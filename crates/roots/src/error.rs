//! Error types for the roots crate.

use thiserror::Error;

/// Errors raised while resolving drivers or assembling a root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RootError {
    /// A configured driver name has no registered implementation.
    #[error("unresolved driver: {name}")]
    UnresolvedDriver {
        /// The name that failed to resolve.
        name: String,
    },

    /// A driver configuration did not declare a driver type.
    #[error("invalid configuration: no driver type declared")]
    InvalidConfiguration,

    /// An attribute rule pattern is not a valid delimited regular expression.
    #[error("malformed attribute pattern {pattern:?}: {reason}")]
    MalformedAttributePattern {
        /// The offending pattern source.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// A command name the file manager does not know.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An attribute name other than read, write, hidden or locked.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}

impl RootError {
    pub(crate) fn malformed(pattern: &str, reason: impl Into<String>) -> Self {
        RootError::MalformedAttributePattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for root operations.
pub type Result<T> = std::result::Result<T, RootError>;
