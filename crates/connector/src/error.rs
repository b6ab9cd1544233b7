//! Error types for the connector crate.

use roots::RootError;
use thiserror::Error;

/// Errors a driver can report from [`Driver::setup`](crate::drivers::Driver::setup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The connector the driver was bound to is gone, or was never set.
    #[error("driver is not bound to a live connector")]
    Detached,

    /// A path key the driver needs is absent from the path table.
    #[error("path table has no entry for {0}")]
    MissingPath(String),
}

/// Connector error type.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Driver resolution or configuration merge failed.
    #[error(transparent)]
    Root(#[from] RootError),

    /// A driver failed to prepare itself.
    #[error("driver {driver} setup failed: {source}")]
    DriverSetup {
        /// Name of the failing driver.
        driver: String,
        #[source]
        source: DriverError,
    },

    /// Required request context was not supplied.
    #[error("missing request context: {0}")]
    MissingContext(String),
}

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;
