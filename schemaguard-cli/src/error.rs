//! CLI error types and result alias.

use miette::Diagnostic;
use schemaguard_core::CoreError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(schemaguard::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(schemaguard::config),
        help("check schemaguard.toml or pass --config <path>")
    )]
    Config(String),

    /// Schema file error
    #[error("Schema error: {0}")]
    #[diagnostic(
        code(schemaguard::schema),
        help("pass --schema <path> or place schema.json in the current directory")
    )]
    Schema(String),

    /// Validation found problems
    #[error("Validation error: {0}")]
    #[diagnostic(code(schemaguard::validation))]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(schemaguard::database))]
    Database(String),

    /// Output rendering error
    #[error("Output error: {0}")]
    #[diagnostic(code(schemaguard::output))]
    Output(String),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::Io(e),
            CoreError::Json(e) => CliError::Schema(e.to_string()),
            CoreError::Config(msg) => CliError::Config(msg),
            CoreError::UnsupportedDialect(name) => {
                CliError::Config(format!("unsupported database type: {}", name))
            }
            CoreError::Validation(msg) => CliError::Validation(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(format!("Failed to serialize JSON: {}", err))
    }
}

impl From<csv::Error> for CliError {
    fn from(err: csv::Error) -> Self {
        CliError::Output(format!("Failed to write CSV: {}", err))
    }
}
