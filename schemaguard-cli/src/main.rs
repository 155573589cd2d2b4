//! SchemaGuard CLI - Check a live database against a schema file.

use clap::Parser;
use miette::Diagnostic;

use schemaguard_cli::cli::{Cli, Command};
use schemaguard_cli::commands::{self, Context};
use schemaguard_cli::error::CliResult;
use schemaguard_cli::output;
use schemaguard_core::logging;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        if let Some(help) = e.help() {
            output::dim(&help.to_string());
        }
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.global.verbose {
        logging::init_with_level("debug");
    } else {
        logging::init();
    }

    let ctx = Context::new(cli.global);
    match cli.command {
        Command::Validate(args) => commands::validate::run(&ctx, args).await,
        Command::Schema(args) => commands::schema::run(&ctx, args).await,
        Command::Fix(args) => commands::fix::run(&ctx, args).await,
        Command::Connection(args) => commands::connection::run(&ctx, args).await,
        Command::Version => commands::version::run().await,
    }
}
