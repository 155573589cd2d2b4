//! Constraint validation against live data.
//!
//! Every check is bounded by [`ValidationConfig::row_limit`] rows per
//! constraint or column. Objects the target schema names but the database
//! lacks become issues rather than errors, and query failures become
//! `*_validation_error` issues unless `stop_on_first_error` is set.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ValidationConfig;
use crate::consistency::validate_schema;
use crate::database::Database;
use crate::dialect::RowIdentifier;
use crate::error::{CoreError, CoreResult};
use crate::model::{Column, ForeignKey, Schema};

/// What an issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A table named by the target is absent from the database.
    MissingTable,
    /// A column named by the target is absent from the database.
    MissingColumn,
    /// A foreign key points at a table the database lacks.
    MissingReferencedTable,
    /// A foreign key points at a column the database lacks.
    MissingReferencedColumn,
    /// A row whose foreign key value has no parent row.
    ForeignKeyViolation,
    /// A NULL in a column the target declares NOT NULL.
    NullConstraintViolation,
    /// Two tables of one schema share a name.
    DuplicateTable,
    /// Two columns of one table share a name.
    DuplicateColumn,
    /// A column with an empty name or data type.
    InvalidColumn,
    /// A foreign key whose columns are absent from its own schema.
    InvalidForeignKey,
    /// The orphan check for a foreign key failed to run.
    ForeignKeyValidationError,
    /// The NULL check for a column failed to run.
    NullValidationError,
}

impl IssueKind {
    /// The snake_case tag used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTable => "missing_table",
            Self::MissingColumn => "missing_column",
            Self::MissingReferencedTable => "missing_referenced_table",
            Self::MissingReferencedColumn => "missing_referenced_column",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::NullConstraintViolation => "null_constraint_violation",
            Self::DuplicateTable => "duplicate_table",
            Self::DuplicateColumn => "duplicate_column",
            Self::InvalidColumn => "invalid_column",
            Self::InvalidForeignKey => "invalid_foreign_key",
            Self::ForeignKeyValidationError => "foreign_key_validation_error",
            Self::NullValidationError => "null_validation_error",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the migration.
    Error,
    /// Worth a look; the migration may still succeed.
    Warning,
}

impl Severity {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding. Issues are never modified once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// What the issue is about.
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// How serious it is.
    pub severity: Severity,
    /// Owning table.
    pub table: String,
    /// Column, when the issue concerns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// The value that broke the constraint, for foreign key violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offending_value: Option<String>,
    /// Best-effort pointer to the offending row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Free-form context such as the constraint name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ValidationIssue {
    /// Create an issue with no column, identifier or details.
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            table: table.into(),
            column: None,
            message: message.into(),
            offending_value: None,
            identifier: None,
            details: BTreeMap::new(),
        }
    }

    /// Set the column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the offending value.
    pub fn with_offending_value(mut self, value: Option<String>) -> Self {
        self.offending_value = value;
        self
    }

    /// Set the row identifier.
    pub fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }

    /// Add a detail entry.
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Whether this is an error-severity issue.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of checking one constraint or column.
#[derive(Debug)]
pub(crate) enum Check {
    /// A referenced object is missing and the configuration says to ignore it.
    Skipped,
    /// A referenced object is missing.
    Missing(ValidationIssue),
    /// The object exists; these rows violate it.
    Violations(Vec<ValidationIssue>),
}

/// Finds live rows that would break the target schema's constraints.
///
/// Row identifiers are resolved once per table and reused for the life of
/// the validator.
pub struct Validator<'a> {
    db: &'a mut Database,
    config: ValidationConfig,
    identifiers: HashMap<String, RowIdentifier>,
}

impl<'a> Validator<'a> {
    /// Create a validator over an open connection.
    pub fn new(db: &'a mut Database, config: ValidationConfig) -> Self {
        Self {
            db,
            config,
            identifiers: HashMap::new(),
        }
    }

    /// The configuration in force.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub(crate) fn database(&mut self) -> &mut Database {
        &mut *self.db
    }

    /// Check every foreign key declared in `target` for orphaned rows.
    pub async fn validate_foreign_keys(&mut self, target: &Schema) -> CoreResult<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        for table in target {
            for fk in &table.foreign_keys {
                match self.check_foreign_key(fk).await {
                    Ok(check) => push_check(&mut issues, check),
                    Err(e) => {
                        if self.config.stop_on_first_error {
                            return Err(CoreError::validation(format!(
                                "failed to validate foreign key {}: {}",
                                fk.constraint_name, e
                            )));
                        }
                        warn!(constraint = %fk.constraint_name, error = %e, "Foreign key validation failed");
                        issues.push(foreign_key_error_issue(fk, &e));
                    }
                }
            }
        }

        info!(issues = issues.len(), "Foreign key validation finished");
        Ok(issues)
    }

    /// Check every NOT NULL column in `target` for null rows.
    ///
    /// Each table is checked for existence once; a missing table yields one
    /// issue no matter how many of its columns are NOT NULL.
    pub async fn validate_not_null(&mut self, target: &Schema) -> CoreResult<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        for table in target {
            let columns: Vec<&Column> = table.columns.iter().filter(|c| c.is_not_null()).collect();
            if columns.is_empty() {
                continue;
            }

            match self.check_table(&table.table_name).await {
                Ok(None) => {}
                Ok(Some(check)) => {
                    push_check(&mut issues, check);
                    continue;
                }
                Err(e) => {
                    issues.push(self.not_null_failure(&table.table_name, None, &e)?);
                    continue;
                }
            }

            for column in columns {
                match self.check_not_null(&table.table_name, column).await {
                    Ok(check) => push_check(&mut issues, check),
                    Err(e) => issues.push(self.not_null_failure(
                        &table.table_name,
                        Some(&column.column_name),
                        &e,
                    )?),
                }
            }
        }

        info!(issues = issues.len(), "NOT NULL validation finished");
        Ok(issues)
    }

    /// Turn a failed NOT NULL check into an issue, or abort when
    /// `stop_on_first_error` is set.
    fn not_null_failure(
        &self,
        table: &str,
        column: Option<&str>,
        err: &CoreError,
    ) -> CoreResult<ValidationIssue> {
        let target = match column {
            Some(column) => format!("{}.{}", table, column),
            None => table.to_string(),
        };
        if self.config.stop_on_first_error {
            return Err(CoreError::validation(format!(
                "failed to validate NOT NULL constraint for {}: {}",
                target, err
            )));
        }
        warn!(target = %target, error = %err, "NOT NULL validation failed");

        let issue = ValidationIssue::new(
            IssueKind::NullValidationError,
            Severity::Error,
            table,
            format!("Failed to validate NOT NULL constraint for {}: {}", target, err),
        )
        .with_detail("error", err.to_string());
        Ok(match column {
            Some(column) => issue.with_column(column),
            None => issue,
        })
    }

    /// Self-consistency, then foreign keys, then NOT NULL, in that order.
    pub async fn validate_all(&mut self, target: &Schema) -> CoreResult<Vec<ValidationIssue>> {
        let mut issues = validate_schema(target);
        issues.extend(self.validate_foreign_keys(target).await?);
        issues.extend(self.validate_not_null(target).await?);
        Ok(issues)
    }

    /// Existence checks followed by the orphan query for one foreign key.
    pub(crate) async fn check_foreign_key(&mut self, fk: &ForeignKey) -> CoreResult<Check> {
        debug!(constraint = %fk.constraint_name, "Checking foreign key");

        if !self.db.table_exists(&fk.table_name).await? {
            return Ok(self.missing_table(
                ValidationIssue::new(
                    IssueKind::MissingTable,
                    Severity::Warning,
                    &fk.table_name,
                    format!(
                        "Table '{}' does not exist in the database (owner of foreign key '{}')",
                        fk.table_name, fk.constraint_name
                    ),
                )
                .with_detail("constraint_name", fk.constraint_name.as_str()),
            ));
        }

        if !self.db.table_exists(&fk.referenced_table).await? {
            return Ok(self.missing_table(
                ValidationIssue::new(
                    IssueKind::MissingReferencedTable,
                    Severity::Error,
                    &fk.table_name,
                    format!(
                        "Referenced table '{}' does not exist in the database (required by foreign key constraint '{}')",
                        fk.referenced_table, fk.constraint_name
                    ),
                )
                .with_column(&fk.column_name)
                .with_detail("constraint_name", fk.constraint_name.as_str())
                .with_detail("referenced_table", fk.referenced_table.as_str()),
            ));
        }

        if !self.db.column_exists(&fk.table_name, &fk.column_name).await? {
            return Ok(self.missing_column(
                ValidationIssue::new(
                    IssueKind::MissingColumn,
                    Severity::Warning,
                    &fk.table_name,
                    format!(
                        "Column '{}.{}' does not exist in the database (used by foreign key '{}')",
                        fk.table_name, fk.column_name, fk.constraint_name
                    ),
                )
                .with_column(&fk.column_name)
                .with_detail("constraint_name", fk.constraint_name.as_str()),
            ));
        }

        if !self
            .db
            .column_exists(&fk.referenced_table, &fk.referenced_column)
            .await?
        {
            return Ok(self.missing_column(
                ValidationIssue::new(
                    IssueKind::MissingReferencedColumn,
                    Severity::Error,
                    &fk.table_name,
                    format!(
                        "Referenced column '{}.{}' does not exist in the database (required by foreign key constraint '{}')",
                        fk.referenced_table, fk.referenced_column, fk.constraint_name
                    ),
                )
                .with_column(&fk.column_name)
                .with_detail("constraint_name", fk.constraint_name.as_str())
                .with_detail("referenced_table", fk.referenced_table.as_str())
                .with_detail("referenced_column", fk.referenced_column.as_str()),
            ));
        }

        let identifier = self.identifier(&fk.table_name).await?;
        let sql = self
            .db
            .dialect()
            .foreign_key_violations_query(fk, &identifier, self.config.row_limit());
        let rows = self.db.query(&sql, &[]).await?;

        let issues = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                let value = cells.next().flatten();
                let id = cells.next().flatten();
                let shown = value.as_deref().unwrap_or_default();
                ValidationIssue::new(
                    IssueKind::ForeignKeyViolation,
                    Severity::Error,
                    &fk.table_name,
                    format!(
                        "Foreign key violation: value '{}' references non-existent record in {}.{}",
                        shown, fk.referenced_table, fk.referenced_column
                    ),
                )
                .with_column(&fk.column_name)
                .with_detail("constraint_name", fk.constraint_name.as_str())
                .with_detail("referenced_table", fk.referenced_table.as_str())
                .with_detail("referenced_column", fk.referenced_column.as_str())
                .with_detail("foreign_key_value", shown)
                .with_offending_value(value)
                .with_identifier(id)
            })
            .collect();

        Ok(Check::Violations(issues))
    }

    /// Existence check for a table whose NOT NULL columns are about to be
    /// checked. `None` when the table exists.
    pub(crate) async fn check_table(&mut self, table: &str) -> CoreResult<Option<Check>> {
        if self.db.table_exists(table).await? {
            return Ok(None);
        }
        Ok(Some(self.missing_table(ValidationIssue::new(
            IssueKind::MissingTable,
            Severity::Warning,
            table,
            format!("Table '{}' does not exist in the database", table),
        ))))
    }

    /// Column existence check followed by the null query for one column of
    /// a table already known to exist.
    pub(crate) async fn check_not_null(&mut self, table: &str, column: &Column) -> CoreResult<Check> {
        debug!(table = %table, column = %column.column_name, "Checking NOT NULL");

        if !self.db.column_exists(table, &column.column_name).await? {
            return Ok(self.missing_column(
                ValidationIssue::new(
                    IssueKind::MissingColumn,
                    Severity::Warning,
                    table,
                    format!(
                        "Column '{}.{}' does not exist in the database",
                        table, column.column_name
                    ),
                )
                .with_column(&column.column_name),
            ));
        }

        let identifier = self.identifier(table).await?;
        let sql = self.db.dialect().null_violations_query(
            table,
            &column.column_name,
            &identifier,
            self.config.row_limit(),
        );
        let rows = self.db.query(&sql, &[]).await?;

        let issues = rows
            .into_iter()
            .map(|row| {
                ValidationIssue::new(
                    IssueKind::NullConstraintViolation,
                    Severity::Error,
                    table,
                    format!(
                        "NULL value found in column '{}' which will be set to NOT NULL",
                        column.column_name
                    ),
                )
                .with_column(&column.column_name)
                .with_detail("data_type", column.data_type.as_str())
                .with_identifier(row.into_iter().next().flatten())
            })
            .collect();

        Ok(Check::Violations(issues))
    }

    async fn identifier(&mut self, table: &str) -> CoreResult<RowIdentifier> {
        if let Some(id) = self.identifiers.get(table) {
            return Ok(id.clone());
        }
        let id = self.db.identifier_column(table).await?;
        debug!(table = %table, identifier = ?id, "Resolved row identifier");
        self.identifiers.insert(table.to_string(), id.clone());
        Ok(id)
    }

    fn missing_table(&self, issue: ValidationIssue) -> Check {
        if self.config.ignore_missing_tables {
            Check::Skipped
        } else {
            Check::Missing(issue)
        }
    }

    fn missing_column(&self, issue: ValidationIssue) -> Check {
        if self.config.ignore_missing_columns {
            Check::Skipped
        } else {
            Check::Missing(issue)
        }
    }
}

fn push_check(issues: &mut Vec<ValidationIssue>, check: Check) {
    match check {
        Check::Skipped => {}
        Check::Missing(issue) => issues.push(issue),
        Check::Violations(found) => issues.extend(found),
    }
}

fn foreign_key_error_issue(fk: &ForeignKey, err: &CoreError) -> ValidationIssue {
    ValidationIssue::new(
        IssueKind::ForeignKeyValidationError,
        Severity::Error,
        &fk.table_name,
        format!(
            "Failed to validate foreign key {} ({}.{} -> {}.{}): {}",
            fk.constraint_name,
            fk.table_name,
            fk.column_name,
            fk.referenced_table,
            fk.referenced_column,
            err
        ),
    )
    .with_column(&fk.column_name)
    .with_detail("constraint_name", fk.constraint_name.as_str())
    .with_detail("error", err.to_string())
}
