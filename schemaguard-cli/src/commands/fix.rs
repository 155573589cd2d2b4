//! `schemaguard fix` command - Repair rows found by validation.
//!
//! Runs as a dry run unless `--confirm` is given.

use schemaguard_core::{ForeignKeyAction, NullAction, Remediator, SafetyMode};

use crate::cli::{FixArgs, FixSubcommand};
use crate::commands::{self, Context};
use crate::error::CliResult;
use crate::output::{self, kv};
use crate::render;

enum Plan {
    ForeignKeys(ForeignKeyAction),
    Nulls(NullAction),
}

/// Run the fix command
pub async fn run(ctx: &Context, args: FixArgs) -> CliResult<()> {
    // Flags are checked before anything touches the config or the database
    let mode = SafetyMode::resolve(args.dry_run, args.confirm)?;
    let plan = match &args.command {
        FixSubcommand::Fk { action } => Plan::ForeignKeys(action.parse()?),
        FixSubcommand::Null {
            action,
            default_value,
        } => Plan::Nulls(NullAction::parse(action, default_value.as_deref())?),
    };

    let config = ctx.config()?;
    let db_config = ctx.db_config(&config)?;
    let (schema_path, target) = ctx.load_target().await?;
    let validation = args.flags.over(&config.validation);

    match &plan {
        Plan::ForeignKeys(action) => {
            output::header("Foreign Key Constraint Fix");
            kv("Action", action.as_str());
        }
        Plan::Nulls(action) => {
            output::header("NULL Value Fix");
            kv("Action", action.as_str());
            if let NullAction::SetDefault(value) = action {
                kv("Default Value", value);
            }
        }
    }
    kv("Connection", ctx.connection_name());
    kv("Database", &db_config.display_target());
    kv("Schema", &schema_path.display().to_string());
    kv("Dry Run", &mode.is_dry_run().to_string());
    output::newline();

    if mode.is_dry_run() {
        output::info("Analyzing violations (dry-run mode)...");
    } else {
        output::warn("MAKING ACTUAL CHANGES TO DATABASE!");
    }

    let mut db = ctx.connect(&db_config).await?;
    let result = {
        let mut remediator = Remediator::new(&mut db, validation, mode);
        match &plan {
            Plan::ForeignKeys(action) => {
                remediator
                    .fix_foreign_key_violations(&target, *action)
                    .await
            }
            Plan::Nulls(action) => remediator.fix_null_value_violations(&target, action).await,
        }
    };
    commands::close(db).await;
    let results = result?;

    ctx.emit(&render::fix_results(&results, mode, ctx.global.format)?)?;

    let failed = results.values().filter(|r| !r.success).count();
    if failed > 0 {
        output::warn(&format!("{} tables could not be fully processed", failed));
    }
    if mode.is_dry_run() {
        output::info("To apply these changes, run with --confirm and without --dry-run");
    } else {
        output::success("Fix operation completed!");
    }

    Ok(())
}
