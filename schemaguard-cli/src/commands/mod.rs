//! CLI command implementations.

pub mod connection;
pub mod fix;
pub mod schema;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use tracing::{debug, warn};

use schemaguard_core::{CoreError, Database, DbConfig, Schema, schema_file};

use crate::cli::GlobalArgs;
use crate::config::{self, Config};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::render;

/// Global flags plus the helpers every command needs.
#[derive(Debug, Clone)]
pub struct Context {
    pub global: GlobalArgs,
}

impl Context {
    pub fn new(global: GlobalArgs) -> Self {
        Self { global }
    }

    /// Load `--config` or `./schemaguard.toml`.
    pub fn config(&self) -> CliResult<Config> {
        Config::load_or_default_path(self.global.config.as_deref())
    }

    /// Name of the selected connection for display.
    pub fn connection_name(&self) -> &str {
        config::display_name(&self.global.connection)
    }

    /// Resolve the selected connection from `config`.
    pub fn db_config(&self, config: &Config) -> CliResult<DbConfig> {
        config.connection(&self.global.connection)
    }

    /// Open a connection, labelling failures with the target.
    pub async fn connect(&self, db_config: &DbConfig) -> CliResult<Database> {
        debug!(
            connection = self.connection_name(),
            target = %db_config.display_target(),
            "Connecting"
        );
        Database::connect(db_config).await.map_err(|e| match e {
            CoreError::UnsupportedDialect(_) | CoreError::Config(_) => e.into(),
            other => CliError::Database(format!(
                "failed to connect to {} as {}: {}",
                db_config.display_target(),
                db_config.username,
                other
            )),
        })
    }

    /// Path of the target schema file.
    pub fn schema_path(&self) -> CliResult<PathBuf> {
        config::schema_path(self.global.schema.as_deref())
    }

    /// Load the target schema file.
    pub async fn load_target(&self) -> CliResult<(PathBuf, Schema)> {
        let path = self.schema_path()?;
        let schema = schema_file::load(&path).await.map_err(|e| {
            CliError::Schema(format!("failed to load {}: {}", path.display(), e))
        })?;
        Ok((path, schema))
    }

    /// Write rendered output to `--output` or stdout.
    pub fn emit(&self, content: &str) -> CliResult<()> {
        render::emit(content, self.global.output.as_deref())?;
        if let Some(path) = &self.global.output {
            output::success(&format!("Saved to: {}", path.display()));
        }
        Ok(())
    }
}

/// Release a connection; a failure to close is only logged.
pub async fn close(db: Database) {
    if let Err(e) = db.close().await {
        warn!(error = %e, "Failed to close database connection");
    }
}
