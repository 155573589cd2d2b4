//! `schemaguard schema` command - Analyse, compare and export schemas.

use schemaguard_core::{Schema, SchemaInfo, ValidationReport, compare, validate_schema};

use crate::cli::{SchemaArgs, SchemaSubcommand};
use crate::commands::{self, Context};
use crate::error::{CliError, CliResult};
use crate::output::{self, kv};
use crate::render;

/// Run the schema command
pub async fn run(ctx: &Context, args: SchemaArgs) -> CliResult<()> {
    match args.command {
        SchemaSubcommand::Compare => run_compare(ctx).await,
        SchemaSubcommand::Validate => run_validate(ctx).await,
        SchemaSubcommand::Info => run_info(ctx).await,
        SchemaSubcommand::Export => run_export(ctx).await,
        SchemaSubcommand::Snapshot => run_snapshot(ctx).await,
    }
}

/// Live catalog vs. the target schema file.
async fn run_compare(ctx: &Context) -> CliResult<()> {
    let (schema_path, target) = ctx.load_target().await?;

    output::header("Schema Comparison");
    kv("Schema", &schema_path.display().to_string());

    let current = read_live_schema(ctx).await?;
    let comparison = compare(&current, &target);
    ctx.emit(&render::comparison(&comparison, ctx.global.format)?)?;

    if comparison.is_empty() {
        output::success("Database matches the target schema");
    } else {
        output::warn(&comparison.summary());
    }
    Ok(())
}

/// Self-consistency of the schema file; no database needed.
async fn run_validate(ctx: &Context) -> CliResult<()> {
    let (schema_path, target) = ctx.load_target().await?;

    output::header("Validate Schema File");
    kv("Schema", &schema_path.display().to_string());
    output::newline();

    let issues = validate_schema(&target);
    let count = issues.len();
    let report = ValidationReport::new(schema_path.display().to_string(), issues);
    ctx.emit(&render::validation_report(&report, ctx.global.format)?)?;

    if count == 0 {
        output::success("Schema file is valid!");
        output::info(&format!("Found {} tables in schema", target.len()));
        return Ok(());
    }

    Err(CliError::Validation(format!(
        "Found {} validation issues in schema file",
        count
    )))
}

/// Statistics about the schema file; no database needed.
async fn run_info(ctx: &Context) -> CliResult<()> {
    let (schema_path, target) = ctx.load_target().await?;
    let info = SchemaInfo::from_schema(schema_path.display().to_string(), &target);
    ctx.emit(&render::schema_info(&info, ctx.global.format)?)
}

/// Live catalog written out in schema-file form.
async fn run_export(ctx: &Context) -> CliResult<()> {
    output::header("Schema Export");
    let current = read_live_schema(ctx).await?;
    ctx.emit(&render::schema(&current, ctx.global.format)?)?;
    output::success(&format!("Exported {} tables", current.len()));
    Ok(())
}

/// Live catalog reduced to table, column and type.
async fn run_snapshot(ctx: &Context) -> CliResult<()> {
    output::header("Schema Snapshot");
    let current = read_live_schema(ctx).await?;
    ctx.emit(&render::snapshot(&current.snapshot(), ctx.global.format)?)?;
    output::success(&format!("Snapshot of {} tables created", current.len()));
    Ok(())
}

async fn read_live_schema(ctx: &Context) -> CliResult<Schema> {
    let config = ctx.config()?;
    let db_config = ctx.db_config(&config)?;
    kv("Connection", ctx.connection_name());
    kv("Database", &db_config.display_target());
    output::newline();

    let mut db = ctx.connect(&db_config).await?;
    let result = db.get_current_schema().await;
    commands::close(db).await;
    Ok(result?)
}
