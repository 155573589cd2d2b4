//! Error types for the schemaguard engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while introspecting, validating or repairing a database.
#[derive(Debug, Error)]
pub enum CoreError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema file could not be parsed or serialized.
    #[error("Schema file error: {0}")]
    Json(#[from] serde_json::Error),

    /// Connecting to or pinging the database failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed to execute.
    #[error("Query error: {0}")]
    Query(String),

    /// The configured database type has no dialect.
    #[error("Unsupported database type: {0}")]
    UnsupportedDialect(String),

    /// Invalid configuration or command options.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading the live catalog failed.
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// Validation was aborted because `stop_on_first_error` is set.
    #[error("Validation aborted: {0}")]
    Validation(String),
}

impl CoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an introspection error.
    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the error ends the invoking command outright.
    ///
    /// Query failures are usually downgraded to issues by the validator, so
    /// only connectivity, dialect and configuration problems are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::UnsupportedDialect(_) | Self::Config(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for CoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            Self::Connection(err.to_string())
        } else {
            // The driver's Display hides the server message behind "db error".
            match err.as_db_error() {
                Some(db) => Self::Query(db.message().to_string()),
                None => Self::Query(err.to_string()),
            }
        }
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for CoreError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Io(e) => Self::Connection(e.to_string()),
            mysql_async::Error::Url(e) => Self::Config(e.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}
