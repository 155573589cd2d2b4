//! `schemaguard connection` command - Inspect and test configured connections.

use serde::Serialize;

use schemaguard_core::{DbConfig, NamedConnection};

use crate::cli::{ConnectionArgs, ConnectionSubcommand, OutputFormat};
use crate::commands::{self, Context};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, kv};
use crate::render::TextTable;

/// Run the connection command
pub async fn run(ctx: &Context, args: ConnectionArgs) -> CliResult<()> {
    match args.command {
        ConnectionSubcommand::Test => run_test(ctx).await,
        ConnectionSubcommand::List => run_list(ctx),
        ConnectionSubcommand::Info => run_info(ctx).await,
    }
}

async fn run_test(ctx: &Context) -> CliResult<()> {
    let config = ctx.config()?;
    let db_config = ctx.db_config(&config)?;

    output::header(&format!("Testing connection '{}'", ctx.connection_name()));
    describe(&db_config);
    output::newline();

    let mut db = match ctx.connect(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            output::error(&e.to_string());
            return Err(CliError::Database("connection test failed".to_string()));
        }
    };
    output::success("Connection successful!");

    match db.get_current_schema().await {
        Ok(schema) => output::info(&format!("Found {} tables in database", schema.len())),
        Err(e) => output::warn(&format!("Could not retrieve schema information: {}", e)),
    }
    commands::close(db).await;
    Ok(())
}

/// One row of `connection list`; passwords are never listed.
#[derive(Debug, Serialize)]
struct ConnectionSummary {
    name: String,
    #[serde(rename = "type")]
    db_type: String,
    host: String,
    port: u16,
    database: String,
    username: String,
}

impl ConnectionSummary {
    fn default_connection(config: &DbConfig) -> Self {
        Self {
            name: "default".to_string(),
            db_type: config.db_type.clone(),
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
            username: config.username.clone(),
        }
    }

    fn named(conn: &NamedConnection) -> Self {
        Self {
            name: conn.name.clone(),
            db_type: conn.db_type.clone(),
            host: conn.host.clone(),
            port: conn.port,
            database: conn.database.clone(),
            username: conn.username.clone(),
        }
    }
}

fn summaries(config: &Config) -> Vec<ConnectionSummary> {
    std::iter::once(ConnectionSummary::default_connection(&config.database.default))
        .chain(config.database.connections.iter().map(ConnectionSummary::named))
        .collect()
}

fn run_list(ctx: &Context) -> CliResult<()> {
    let config = ctx.config()?;
    let rows = summaries(&config);

    let content = match ctx.global.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&rows)?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in &rows {
                writer.serialize(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| CliError::Output(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| CliError::Output(e.to_string()))?
        }
        OutputFormat::Table => {
            let mut table = TextTable::new(["Name", "Type", "Host", "Port", "Database", "User"]);
            for row in &rows {
                let port = if row.port == 0 {
                    String::new()
                } else {
                    row.port.to_string()
                };
                table.row([
                    row.name.clone(),
                    row.db_type.clone(),
                    row.host.clone(),
                    port,
                    row.database.clone(),
                    row.username.clone(),
                ]);
            }
            table.render()
        }
    };

    ctx.emit(&content)?;
    output::dim("Use --connection <name> to select a named connection; empty fields inherit from default.");
    Ok(())
}

async fn run_info(ctx: &Context) -> CliResult<()> {
    let config = ctx.config()?;
    let db_config = ctx.db_config(&config)?;

    output::header(&format!("Connection Information: {}", ctx.connection_name()));
    describe(&db_config);
    kv(
        "Password",
        if db_config.password.is_empty() {
            "[not set]"
        } else {
            "[configured]"
        },
    );
    output::newline();

    match ctx.connect(&db_config).await {
        Ok(mut db) => {
            output::success("Status: Connected successfully");
            if let Ok(schema) = db.get_current_schema().await {
                kv("Tables", &schema.len().to_string());
            }
            commands::close(db).await;
        }
        Err(e) => {
            output::error("Status: Connection failed");
            output::dim(&e.to_string());
        }
    }
    Ok(())
}

fn describe(db_config: &DbConfig) {
    kv("Type", &db_config.db_type);
    kv("Host", &format!("{}:{}", db_config.host, db_config.port));
    kv("Database", &db_config.database);
    kv("User", &db_config.username);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summaries_list_default_first_without_passwords() {
        let config = Config::parse(
            r#"
[database.default]
host = "localhost"
port = 5432
username = "app"
password = "secret"
database = "shop"

[[database.connections]]
name = "staging"
host = "staging.internal"
"#,
        )
        .unwrap();

        let rows = summaries(&config);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["default", "staging"]);
        assert_eq!(rows[1].port, 0);

        let json = serde_json::to_string(&rows).unwrap();
        assert!(!json.contains("secret"));
    }
}
