//! `schemaguard validate` command - Find rows that would break the target schema.

use schemaguard_core::{ValidationReport, Validator};

use crate::cli::{ValidateArgs, ValidateSubcommand};
use crate::commands::{self, Context};
use crate::error::CliResult;
use crate::output::{self, kv};
use crate::render;

/// Run the validate command
pub async fn run(ctx: &Context, args: ValidateArgs) -> CliResult<()> {
    let config = ctx.config()?;
    let db_config = ctx.db_config(&config)?;
    let (schema_path, target) = ctx.load_target().await?;
    let validation = args.flags.over(&config.validation);

    output::header(match args.command {
        ValidateSubcommand::Fk => "Foreign Key Validation",
        ValidateSubcommand::Null => "NOT NULL Validation",
        ValidateSubcommand::All => "Full Validation",
    });
    kv("Connection", ctx.connection_name());
    kv("Database", &db_config.display_target());
    kv("Schema", &schema_path.display().to_string());
    output::newline();

    let mut db = ctx.connect(&db_config).await?;
    let result = {
        let mut validator = Validator::new(&mut db, validation);
        match args.command {
            ValidateSubcommand::Fk => validator.validate_foreign_keys(&target).await,
            ValidateSubcommand::Null => validator.validate_not_null(&target).await,
            ValidateSubcommand::All => validator.validate_all(&target).await,
        }
    };
    commands::close(db).await;
    let issues = result?;

    let report = ValidationReport::new(ctx.connection_name(), issues);
    ctx.emit(&render::validation_report(&report, ctx.global.format)?)?;

    let summary = &report.summary;
    if summary.total_issues == 0 {
        output::success("No validation issues found");
    } else if report.has_errors() {
        output::error(&format!(
            "Found {} issues ({} errors, {} warnings)",
            summary.total_issues, summary.error_count, summary.warning_count
        ));
    } else {
        output::warn(&format!("Found {} warnings", summary.warning_count));
    }

    Ok(())
}
