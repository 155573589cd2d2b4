//! Connection and validation configuration values.
//!
//! These are plain data threaded into the engine's entry points; loading them
//! from disk is the caller's concern.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Settings for a single database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Database type: `postgres` or `mysql`. Empty means `postgres`.
    #[serde(rename = "type")]
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// PostgreSQL `sslmode`; `disable` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_type: "postgres".to_string(),
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            ssl_mode: None,
        }
    }
}

impl DbConfig {
    /// Check that the fields needed to connect are present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.host.is_empty() {
            return Err(CoreError::config("database host is required"));
        }
        if self.port == 0 {
            return Err(CoreError::config("database port must be greater than 0"));
        }
        if self.username.is_empty() {
            return Err(CoreError::config("database username is required"));
        }
        if self.database.is_empty() {
            return Err(CoreError::config("database name is required"));
        }
        Ok(())
    }

    /// `host:port/database`, for display.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// A named connection; empty fields inherit from the default connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedConnection {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub db_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub port: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

/// The default connection plus any named overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    pub default: DbConfig,
    pub connections: Vec<NamedConnection>,
}

impl ConnectionsConfig {
    /// Resolve a connection by name.
    ///
    /// An empty name selects the default. A named connection starts from the
    /// default and overrides each field it sets.
    pub fn resolve(&self, name: &str) -> CoreResult<DbConfig> {
        if name.is_empty() {
            return Ok(self.default.clone());
        }

        let conn = self
            .connections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                CoreError::config(format!("connection '{}' not found in configuration", name))
            })?;

        let mut config = self.default.clone();
        if !conn.db_type.is_empty() {
            config.db_type = conn.db_type.clone();
        }
        if !conn.host.is_empty() {
            config.host = conn.host.clone();
        }
        if conn.port != 0 {
            config.port = conn.port;
        }
        if !conn.username.is_empty() {
            config.username = conn.username.clone();
        }
        if !conn.password.is_empty() {
            config.password = conn.password.clone();
        }
        if !conn.database.is_empty() {
            config.database = conn.database.clone();
        }
        if conn.ssl_mode.is_some() {
            config.ssl_mode = conn.ssl_mode.clone();
        }
        Ok(config)
    }

    /// Validate the default connection and require a name on every named one.
    pub fn validate(&self) -> CoreResult<()> {
        self.default
            .validate()
            .map_err(|e| CoreError::config(format!("default connection: {}", e)))?;

        for (i, conn) in self.connections.iter().enumerate() {
            if conn.name.is_empty() {
                return Err(CoreError::config(format!(
                    "connection at index {} must have a name",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Knobs for the validator and remediator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Skip tables missing from the live database instead of reporting them.
    pub ignore_missing_tables: bool,
    /// Skip columns missing from the live database instead of reporting them.
    pub ignore_missing_columns: bool,
    /// Abort on the first query failure instead of recording an error issue.
    pub stop_on_first_error: bool,
    /// Row cap per constraint or column.
    pub max_issues_per_table: usize,
}

/// Default row cap per constraint or column.
pub const DEFAULT_MAX_ISSUES: usize = 1000;

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ignore_missing_tables: false,
            ignore_missing_columns: false,
            stop_on_first_error: false,
            max_issues_per_table: DEFAULT_MAX_ISSUES,
        }
    }
}

impl ValidationConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip missing tables.
    pub fn ignore_missing_tables(mut self, ignore: bool) -> Self {
        self.ignore_missing_tables = ignore;
        self
    }

    /// Skip missing columns.
    pub fn ignore_missing_columns(mut self, ignore: bool) -> Self {
        self.ignore_missing_columns = ignore;
        self
    }

    /// Abort on the first internal error.
    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    /// Set the row cap; zero falls back to the default.
    pub fn max_issues_per_table(mut self, max: usize) -> Self {
        self.max_issues_per_table = max;
        self
    }

    /// The effective row cap.
    pub fn row_limit(&self) -> usize {
        if self.max_issues_per_table == 0 {
            DEFAULT_MAX_ISSUES
        } else {
            self.max_issues_per_table
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn connections() -> ConnectionsConfig {
        ConnectionsConfig {
            default: DbConfig {
                db_type: "postgres".to_string(),
                host: "db.internal".to_string(),
                port: 5432,
                username: "app".to_string(),
                password: "secret".to_string(),
                database: "app".to_string(),
                ssl_mode: None,
            },
            connections: vec![NamedConnection {
                name: "reporting".to_string(),
                database: "reporting".to_string(),
                port: 6432,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_resolve_default() {
        let config = connections();
        assert_eq!(config.resolve("").unwrap(), config.default);
    }

    #[test]
    fn test_resolve_named_overrides_only_set_fields() {
        let resolved = connections().resolve("reporting").unwrap();
        assert_eq!(resolved.database, "reporting");
        assert_eq!(resolved.port, 6432);
        assert_eq!(resolved.host, "db.internal");
        assert_eq!(resolved.username, "app");
        assert_eq!(resolved.password, "secret");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = connections().resolve("nope").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_validate_requires_host_and_names() {
        let mut config = connections();
        assert!(config.validate().is_ok());

        config.connections.push(NamedConnection::default());
        assert!(config.validate().is_err());

        let mut config = connections();
        config.default.host.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_defaults() {
        let config = ValidationConfig::default();
        assert!(!config.ignore_missing_tables);
        assert!(!config.ignore_missing_columns);
        assert!(!config.stop_on_first_error);
        assert_eq!(config.max_issues_per_table, 1000);
        assert_eq!(config.max_issues_per_table(0).row_limit(), 1000);
    }
}
