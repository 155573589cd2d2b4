//! Repair of constraint violations, gated by an explicit safety mode.
//!
//! The remediator reuses the validator's checks to find violations, then in
//! [`SafetyMode::Confirmed`] issues one anti-join-scoped `DELETE` or `UPDATE`
//! per constraint or column. A dry run instead counts, with no row limit, the
//! rows that statement would touch. Statements run directly on the connection
//! with no surrounding transaction; whatever was applied before a failure
//! stays applied and is reported.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ValidationConfig;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::model::Schema;
use crate::validate::{Check, Validator};

/// Whether repairs are simulated or applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyMode {
    /// Count what would change; write nothing.
    DryRun,
    /// Execute corrective statements.
    Confirmed,
}

impl SafetyMode {
    /// Resolve the mode from an explicit dry-run choice and a confirm flag.
    ///
    /// With neither given the mode is `DryRun`. `confirm` alone selects
    /// `Confirmed`. An explicit dry run wins over `confirm`. Turning dry run
    /// off without `confirm` is rejected.
    pub fn resolve(dry_run: Option<bool>, confirm: bool) -> CoreResult<Self> {
        match (dry_run, confirm) {
            (None, false) | (Some(true), false) => Ok(Self::DryRun),
            (Some(true), true) => {
                warn!("Both dry run and confirm requested; running as dry run");
                Ok(Self::DryRun)
            }
            (None, true) | (Some(false), true) => Ok(Self::Confirmed),
            (Some(false), false) => Err(CoreError::config(
                "must use --confirm flag when not in dry-run mode",
            )),
        }
    }

    /// Whether nothing will be written.
    pub fn is_dry_run(&self) -> bool {
        *self == Self::DryRun
    }
}

/// What to do with orphaned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// Delete orphaned rows.
    Remove,
    /// Null out the foreign key column on orphaned rows.
    SetNull,
}

impl ForeignKeyAction {
    /// The action name as given on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::SetNull => "set-null",
        }
    }
}

impl FromStr for ForeignKeyAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(Self::Remove),
            "set-null" => Ok(Self::SetNull),
            "" => Err(CoreError::config("--action is required (remove|set-null)")),
            other => Err(CoreError::config(format!(
                "invalid action: {} (must be 'remove' or 'set-null')",
                other
            ))),
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with rows holding nulls in a NOT NULL column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NullAction {
    /// Delete the rows.
    Remove,
    /// Fill the nulls with a literal.
    SetDefault(String),
}

impl NullAction {
    /// Parse an action name, taking the literal for `set-default`.
    pub fn parse(action: &str, default_value: Option<&str>) -> CoreResult<Self> {
        match action {
            "remove" => Ok(Self::Remove),
            "set-default" => match default_value {
                Some(value) if !value.is_empty() => Ok(Self::SetDefault(value.to_string())),
                _ => Err(CoreError::config(
                    "--default-value is required when using 'set-default' action",
                )),
            },
            "" => Err(CoreError::config("--action is required (remove|set-default)")),
            other => Err(CoreError::config(format!(
                "invalid action: {} (must be 'remove' or 'set-default')",
                other
            ))),
        }
    }

    /// The action name as given on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::SetDefault(_) => "set-default",
        }
    }
}

/// Tally for one table across every constraint or column touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    /// Violations found.
    pub issues_found: usize,
    /// Rows changed, or rows that would change in a dry run.
    pub records_affected: u64,
    /// False once any sub-operation failed.
    pub success: bool,
    /// Every failure message, joined with `; `.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One line per constraint or column processed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Default for FixResult {
    fn default() -> Self {
        Self {
            issues_found: 0,
            records_affected: 0,
            success: true,
            error: None,
            details: Vec::new(),
        }
    }
}

impl FixResult {
    fn fail(&mut self, message: String) {
        self.success = false;
        self.error = Some(match self.error.take() {
            Some(previous) => format!("{}; {}", previous, message),
            None => message,
        });
    }
}

/// Per-table results in the order tables were first touched.
pub type FixResults = IndexMap<String, FixResult>;

/// SQL for one repair: the uncapped count a dry run reports and the
/// statement a confirmed run executes.
struct Repair {
    count: String,
    statement: String,
}

/// What a check leaves for the caller to do.
enum Tally {
    Continue,
    Stop,
    Violations(usize),
}

/// Applies or simulates repairs for a target schema.
pub struct Remediator<'a> {
    validator: Validator<'a>,
    dialect: &'static dyn Dialect,
    mode: SafetyMode,
}

impl<'a> Remediator<'a> {
    /// Create a remediator over an open connection.
    pub fn new(db: &'a mut Database, config: ValidationConfig, mode: SafetyMode) -> Self {
        Self {
            dialect: db.dialect(),
            validator: Validator::new(db, config),
            mode,
        }
    }

    /// The mode in force.
    pub fn mode(&self) -> SafetyMode {
        self.mode
    }

    /// Repair orphaned rows for every foreign key in `target`.
    pub async fn fix_foreign_key_violations(
        &mut self,
        target: &Schema,
        action: ForeignKeyAction,
    ) -> CoreResult<FixResults> {
        info!(action = %action, mode = ?self.mode, "Fixing foreign key violations");
        let mut results = FixResults::new();

        'tables: for table in target {
            for fk in &table.foreign_keys {
                let check = self.validator.check_foreign_key(fk).await;
                let repair = Repair {
                    count: self.dialect.count_orphans_query(fk),
                    statement: match action {
                        ForeignKeyAction::Remove => self.dialect.delete_orphans_statement(fk),
                        ForeignKeyAction::SetNull => self.dialect.nullify_orphans_statement(fk),
                    },
                };
                let label = format!("{} ({})", fk.constraint_name, action);

                if !self
                    .apply(&mut results, &fk.table_name, &label, check, &repair)
                    .await
                {
                    break 'tables;
                }
            }
        }

        Ok(results)
    }

    /// Repair null values for every NOT NULL column in `target`.
    ///
    /// Each table is checked for existence once, before its columns.
    pub async fn fix_null_value_violations(
        &mut self,
        target: &Schema,
        action: &NullAction,
    ) -> CoreResult<FixResults> {
        info!(action = action.as_str(), mode = ?self.mode, "Fixing NULL value violations");
        let mut results = FixResults::new();

        'tables: for table in target {
            let name = table.table_name.as_str();
            let columns: Vec<_> = table.columns.iter().filter(|c| c.is_not_null()).collect();
            if columns.is_empty() {
                continue;
            }

            if let Some(check) = self.validator.check_table(name).await.transpose() {
                if let Tally::Stop = self.tally(&mut results, name, name, check) {
                    break 'tables;
                }
                continue;
            }

            for column in columns {
                let check = self.validator.check_not_null(name, column).await;
                let repair = Repair {
                    count: self.dialect.count_nulls_query(name, &column.column_name),
                    statement: match action {
                        NullAction::Remove => {
                            self.dialect.delete_nulls_statement(name, &column.column_name)
                        }
                        NullAction::SetDefault(value) => {
                            self.dialect
                                .fill_nulls_statement(name, &column.column_name, value)
                        }
                    },
                };
                let label = format!("{} ({})", column.column_name, action.as_str());

                if !self.apply(&mut results, name, &label, check, &repair).await {
                    break 'tables;
                }
            }
        }

        Ok(results)
    }

    /// Record a check outcome that needs no repair; hand back violation
    /// counts for the caller.
    fn tally(
        &self,
        results: &mut FixResults,
        table: &str,
        label: &str,
        check: CoreResult<Check>,
    ) -> Tally {
        match check {
            Ok(Check::Skipped) => Tally::Continue,
            Ok(Check::Missing(issue)) => {
                entry(results, table).fail(issue.message);
                Tally::Continue
            }
            Ok(Check::Violations(violations)) => Tally::Violations(violations.len()),
            Err(e) => {
                warn!(table = %table, target = %label, error = %e, "Violation check failed");
                entry(results, table).fail(format!("{}: {}", label, e));
                self.after_failure()
            }
        }
    }

    fn after_failure(&self) -> Tally {
        if self.validator.config().stop_on_first_error {
            Tally::Stop
        } else {
            Tally::Continue
        }
    }

    /// Fold one check into `results`, then count or execute the repair.
    ///
    /// Returns false when processing should stop.
    async fn apply(
        &mut self,
        results: &mut FixResults,
        table: &str,
        label: &str,
        check: CoreResult<Check>,
        repair: &Repair,
    ) -> bool {
        let violations = match self.tally(results, table, label, check) {
            Tally::Continue => return true,
            Tally::Stop => return false,
            Tally::Violations(violations) => violations,
        };

        entry(results, table).issues_found += violations;
        if violations == 0 {
            return true;
        }

        let outcome = match self.mode {
            SafetyMode::DryRun => self
                .validator
                .database()
                .count(&repair.count, label)
                .await
                .map(|count| (count, format!("{}: {} rows would be affected", label, count))),
            SafetyMode::Confirmed => {
                warn!(table = %table, target = %label, "Applying changes");
                self.validator
                    .database()
                    .execute(&repair.statement)
                    .await
                    .map(|affected| (affected, format!("{}: {} rows affected", label, affected)))
            }
        };

        match outcome {
            Ok((affected, detail)) => {
                let result = entry(results, table);
                result.records_affected += affected;
                result.details.push(detail);
                info!(
                    table = %table,
                    target = %label,
                    affected,
                    mode = ?self.mode,
                    "Processed fix"
                );
                true
            }
            Err(e) => {
                warn!(table = %table, target = %label, error = %e, "Fix statement failed");
                entry(results, table).fail(format!("{}: {}", label, e));
                !matches!(self.after_failure(), Tally::Stop)
            }
        }
    }
}

fn entry<'r>(results: &'r mut FixResults, table: &str) -> &'r mut FixResult {
    results.entry(table.to_string()).or_default()
}
