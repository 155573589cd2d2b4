//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use schemaguard_core::ValidationConfig;

/// Schemaguard - check a live database against a schema file before migrating
#[derive(Parser, Debug)]
#[command(name = "schemaguard")]
#[command(version)]
#[command(
    about = "Schemaguard - check a live database against a schema file before migrating",
    long_about = "Finds the rows and structural drift that would make a migration fail.\n\n\
    Schemaguard compares the live catalog with a target schema file, reports\n\
    orphaned foreign key values and NULLs in columns about to become NOT NULL,\n\
    and can repair them. Repairs are simulated unless --confirm is given."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default is ./schemaguard.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database connection name from the config file
    #[arg(short = 'c', long, global = true, default_value = "")]
    pub connection: String,

    /// Target schema file (default is ./schema.json)
    #[arg(short, long, global = true)]
    pub schema: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Output file (default is stdout)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Supported output formats
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validation commands for migration readiness
    Validate(ValidateArgs),

    /// Schema analysis and comparison commands
    Schema(SchemaArgs),

    /// Fix database issues found during validation
    Fix(FixArgs),

    /// Database connection commands
    #[command(alias = "conn")]
    Connection(ConnectionArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Validation flags
// =============================================================================

/// Knobs that change how violations are collected
#[derive(Args, Debug, Clone, Default)]
pub struct ValidationFlags {
    /// Skip checks whose table does not exist instead of reporting it
    #[arg(long, global = true)]
    pub ignore_missing_tables: bool,

    /// Skip checks whose column does not exist instead of reporting it
    #[arg(long, global = true)]
    pub ignore_missing_columns: bool,

    /// Abort on the first check that fails to run
    #[arg(long, global = true)]
    pub stop_on_first_error: bool,

    /// Maximum rows reported per constraint or column [default: 1000]
    #[arg(long, global = true, value_name = "N")]
    pub max_issues: Option<usize>,
}

impl ValidationFlags {
    /// Flags merged over the `[validation]` section; a flag that is set wins.
    pub fn over(&self, base: &ValidationConfig) -> ValidationConfig {
        ValidationConfig::new()
            .ignore_missing_tables(self.ignore_missing_tables || base.ignore_missing_tables)
            .ignore_missing_columns(self.ignore_missing_columns || base.ignore_missing_columns)
            .stop_on_first_error(self.stop_on_first_error || base.stop_on_first_error)
            .max_issues_per_table(self.max_issues.unwrap_or(base.max_issues_per_table))
    }
}

// =============================================================================
// Validate Command
// =============================================================================

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(subcommand)]
    pub command: ValidateSubcommand,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

/// Validate subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateSubcommand {
    /// Find rows whose foreign key value has no parent row
    #[command(aliases = ["foreign-key", "foreign-keys"])]
    Fk,

    /// Find NULLs in columns the target schema declares NOT NULL
    #[command(aliases = ["not-null", "nulls"])]
    Null,

    /// Schema file checks, then foreign keys, then NOT NULL
    All,
}

// =============================================================================
// Schema Command
// =============================================================================

/// Arguments for the `schema` command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaSubcommand,
}

/// Schema subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSubcommand {
    /// Compare the live database schema with the target schema
    #[command(aliases = ["diff", "compare-schema"])]
    Compare,

    /// Check the target schema file for structural problems
    #[command(alias = "check")]
    Validate,

    /// Display statistics about the target schema
    #[command(aliases = ["stats", "summary"])]
    Info,

    /// Export the live database schema as a schema file
    #[command(aliases = ["dump", "extract"])]
    Export,

    /// Export table and column types only
    #[command(aliases = ["snap", "simple"])]
    Snapshot,
}

// =============================================================================
// Fix Command
// =============================================================================

/// Arguments for the `fix` command
#[derive(Args, Debug)]
pub struct FixArgs {
    #[command(subcommand)]
    pub command: FixSubcommand,

    /// Show what would change without changing anything (the default)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub dry_run: Option<bool>,

    /// Apply the changes
    #[arg(long, global = true)]
    pub confirm: bool,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

/// Fix subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FixSubcommand {
    /// Remove orphaned rows or null their foreign key column
    #[command(aliases = ["foreign-key", "foreign-keys"])]
    Fk {
        /// Fix action: remove | set-null
        #[arg(long, default_value = "")]
        action: String,
    },

    /// Remove rows with NULLs or fill them with a value
    #[command(aliases = ["not-null", "nulls"])]
    Null {
        /// Fix action: remove | set-default
        #[arg(long, default_value = "")]
        action: String,

        /// Value written by set-default
        #[arg(long)]
        default_value: Option<String>,
    },
}

// =============================================================================
// Connection Command
// =============================================================================

/// Arguments for the `connection` command
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    #[command(subcommand)]
    pub command: ConnectionSubcommand,
}

/// Connection subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSubcommand {
    /// Connect and report how many tables the database has
    #[command(aliases = ["ping", "check"])]
    Test,

    /// List the default and named connections
    #[command(alias = "ls")]
    List,

    /// Show the resolved settings of one connection
    #[command(alias = "show")]
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate_with_globals() {
        let cli = Cli::try_parse_from([
            "schemaguard",
            "validate",
            "fk",
            "--connection",
            "staging",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.global.connection, "staging");
        assert_eq!(cli.global.format, OutputFormat::Json);
        match cli.command {
            Command::Validate(args) => assert_eq!(args.command, ValidateSubcommand::Fk),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_fix_aliases_and_flags() {
        let cli = Cli::try_parse_from([
            "schemaguard",
            "fix",
            "not-null",
            "--action",
            "set-default",
            "--default-value",
            "unknown",
            "--confirm",
        ])
        .unwrap();

        let Command::Fix(args) = cli.command else {
            panic!("expected fix");
        };
        assert!(args.confirm);
        assert_eq!(args.dry_run, None);
        match args.command {
            FixSubcommand::Null {
                action,
                default_value,
            } => {
                assert_eq!(action, "set-default");
                assert_eq!(default_value.as_deref(), Some("unknown"));
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dry_run_forms() {
        let dry_run = |extra: &[&'static str]| {
            let mut argv = vec!["schemaguard", "fix", "fk", "--action", "remove"];
            argv.extend_from_slice(extra);
            match Cli::try_parse_from(argv).unwrap().command {
                Command::Fix(args) => args.dry_run,
                other => panic!("unexpected command: {:?}", other),
            }
        };

        assert_eq!(dry_run(&[]), None);
        assert_eq!(dry_run(&["--dry-run"]), Some(true));
        assert_eq!(dry_run(&["--dry-run=false"]), Some(false));
    }

    #[test]
    fn test_flags_over_config() {
        let base = ValidationConfig::new()
            .ignore_missing_columns(true)
            .max_issues_per_table(50);

        let flags = ValidationFlags::default();
        assert_eq!(flags.over(&base), base);

        let flags = ValidationFlags {
            stop_on_first_error: true,
            max_issues: Some(10),
            ..ValidationFlags::default()
        };
        let merged = flags.over(&base);
        assert!(merged.ignore_missing_columns);
        assert!(merged.stop_on_first_error);
        assert_eq!(merged.max_issues_per_table, 10);
    }

    #[test]
    fn test_explicit_max_issues_wins_even_at_default_value() {
        let cli =
            Cli::try_parse_from(["schemaguard", "validate", "all", "--max-issues", "1000"])
                .unwrap();
        let flags = match cli.command {
            Command::Validate(args) => args.flags,
            other => panic!("unexpected command: {:?}", other),
        };
        assert_eq!(flags.max_issues, Some(1000));

        let base = ValidationConfig::new().max_issues_per_table(500);
        assert_eq!(flags.over(&base).max_issues_per_table, 1000);

        let cli = Cli::try_parse_from(["schemaguard", "validate", "all"]).unwrap();
        let flags = match cli.command {
            Command::Validate(args) => args.flags,
            other => panic!("unexpected command: {:?}", other),
        };
        assert_eq!(flags.max_issues, None);
        assert_eq!(flags.over(&base).max_issues_per_table, 500);
    }
}
