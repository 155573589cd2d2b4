//! CLI configuration handling.
//!
//! ```toml
//! [database.default]
//! type = "postgres"
//! host = "localhost"
//! port = 5432
//! username = "app"
//! password = "secret"
//! database = "shop"
//!
//! [[database.connections]]
//! name = "staging"
//! host = "staging.internal"
//!
//! [validation]
//! ignore_missing_tables = true
//! max_issues_per_table = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use schemaguard_core::{ConnectionsConfig, DbConfig, ValidationConfig};

use crate::error::{CliError, CliResult};

/// Default config file name (lives in the working directory)
pub const CONFIG_FILE_NAME: &str = "schemaguard.toml";

/// Default schema file name (lives in the working directory)
pub const SCHEMA_FILE_NAME: &str = "schema.json";

/// Schemaguard CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default and named connections
    pub database: ConnectionsConfig,

    /// Validation defaults; command-line flags take precedence
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path`, or `./schemaguard.toml` when none is given
    pub fn load_or_default_path(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&std::env::current_dir()?.join(CONFIG_FILE_NAME)),
        }
    }

    /// Resolve and validate the connection called `name`; empty means default
    pub fn connection(&self, name: &str) -> CliResult<DbConfig> {
        let config = self.database.resolve(name)?;
        config.validate().map_err(|e| {
            CliError::Config(format!("connection '{}': {}", display_name(name), e))
        })?;
        Ok(config)
    }
}

/// `default` for the empty connection name
pub fn display_name(name: &str) -> &str {
    if name.is_empty() { "default" } else { name }
}

/// The schema file to read: `--schema`, else `./schema.json`
pub fn schema_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?.join(SCHEMA_FILE_NAME),
    };
    if !path.exists() {
        return Err(CliError::Schema(format!(
            "Schema file not found: {}",
            path.display()
        )));
    }
    Ok(path)
}
