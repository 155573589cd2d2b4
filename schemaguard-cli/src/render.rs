//! Rendering of engine results as aligned text tables, JSON or CSV.
//!
//! Every renderer returns the full document as a string; [`emit`] writes it
//! to stdout or to the `--output` file.

use std::path::Path;

use serde::Serialize;

use schemaguard_core::{
    FixResults, SafetyMode, Schema, SchemaComparison, SchemaInfo, SchemaSnapshot,
    ValidationReport, schema_file,
};

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

/// Column-aligned plain text table.
#[derive(Debug, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// An empty table with the given column headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; cells beyond the headers still get a column.
    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Whether no rows were added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers, a dashed rule, then the rows, each column padded to its
    /// widest cell and trailing space trimmed.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn to_csv<R>(headers: &[&str], rows: R) -> CliResult<String>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CliError::Output(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CliError::Output(e.to_string()))
}

/// Validation issues with a summary line.
pub fn validation_report(report: &ValidationReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Csv => to_csv(
            &[
                "Severity",
                "Type",
                "Table",
                "Column",
                "Message",
                "Identifier",
                "OffendingValue",
            ],
            report.issues.iter().map(|issue| {
                vec![
                    issue.severity.to_string(),
                    issue.kind.to_string(),
                    issue.table.clone(),
                    issue.column.clone().unwrap_or_default(),
                    issue.message.clone(),
                    issue.identifier.clone().unwrap_or_default(),
                    issue.offending_value.clone().unwrap_or_default(),
                ]
            }),
        ),
        OutputFormat::Table => {
            if report.issues.is_empty() {
                return Ok("No validation issues found!\n".to_string());
            }

            let mut table =
                TextTable::new(["Severity", "Type", "Table", "Column", "Message", "Identifier"]);
            for issue in &report.issues {
                table.row([
                    issue.severity.as_str().to_uppercase(),
                    issue.kind.to_string(),
                    issue.table.clone(),
                    issue.column.clone().unwrap_or_default(),
                    issue.message.clone(),
                    issue.identifier.clone().unwrap_or_default(),
                ]);
            }

            let summary = &report.summary;
            let mut out = table.render();
            out.push('\n');
            out.push_str(&format!(
                "Total: {}  Errors: {}  Warnings: {}  Tables: {}  Connection: {}\n",
                summary.total_issues,
                summary.error_count,
                summary.warning_count,
                summary.tables_covered,
                report.connection_name
            ));
            Ok(out)
        }
    }
}

/// Structural drift between the live and target schema.
pub fn comparison(comparison: &SchemaComparison, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(comparison),
        OutputFormat::Csv => to_csv(&["Change", "Table", "Column", "Details"], drift_rows(comparison)),
        OutputFormat::Table => {
            if comparison.is_empty() {
                return Ok("Schemas match: no differences found.\n".to_string());
            }

            let mut out = String::new();
            if !comparison.missing_tables.is_empty() {
                let mut table = TextTable::new(["Missing Tables"]);
                for name in &comparison.missing_tables {
                    table.row([name.as_str()]);
                }
                out.push_str(&table.render());
                out.push('\n');
            }
            if !comparison.extra_tables.is_empty() {
                let mut table = TextTable::new(["Extra Tables"]);
                for name in &comparison.extra_tables {
                    table.row([name.as_str()]);
                }
                out.push_str(&table.render());
                out.push('\n');
            }

            for (name, diff) in &comparison.table_differences {
                out.push_str(&format!("Table: {}\n", name));
                let mut table = TextTable::new(["Change", "Column", "Details"]);
                for mut row in drift_rows_for(name, diff) {
                    row.remove(1);
                    table.row(row);
                }
                out.push_str(&table.render());
                out.push('\n');
            }

            out.push_str(&comparison.summary());
            out.push('\n');
            Ok(out)
        }
    }
}

fn drift_rows(comparison: &SchemaComparison) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for name in &comparison.missing_tables {
        rows.push(vec!["MISSING TABLE".into(), name.clone(), String::new(), String::new()]);
    }
    for name in &comparison.extra_tables {
        rows.push(vec!["EXTRA TABLE".into(), name.clone(), String::new(), String::new()]);
    }
    for (name, diff) in &comparison.table_differences {
        rows.extend(drift_rows_for(name, diff));
    }
    rows
}

fn drift_rows_for(table: &str, diff: &schemaguard_core::TableDifference) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for column in &diff.missing_columns {
        rows.push(vec![
            "MISSING".into(),
            table.to_string(),
            column.column_name.clone(),
            format!("{}, nullable {}", column.full_type(), column.is_nullable),
        ]);
    }
    for column in &diff.extra_columns {
        rows.push(vec![
            "EXTRA".into(),
            table.to_string(),
            column.column_name.clone(),
            format!("{}, nullable {}", column.full_type(), column.is_nullable),
        ]);
    }
    for (name, change) in &diff.modified_columns {
        rows.push(vec![
            "MODIFIED".into(),
            table.to_string(),
            name.clone(),
            format!(
                "{} {} default '{}' -> {} {} default '{}'",
                change.current.full_type(),
                change.current.is_nullable,
                change.current.default_text(),
                change.target.full_type(),
                change.target.is_nullable,
                change.target.default_text()
            ),
        ]);
    }
    for fk in &diff.foreign_key_diffs.missing {
        rows.push(vec![
            "MISSING FK".into(),
            table.to_string(),
            fk.column_name.clone(),
            format!("{} -> {}.{}", fk.constraint_name, fk.referenced_table, fk.referenced_column),
        ]);
    }
    for fk in &diff.foreign_key_diffs.extra {
        rows.push(vec![
            "EXTRA FK".into(),
            table.to_string(),
            fk.column_name.clone(),
            format!("{} -> {}.{}", fk.constraint_name, fk.referenced_table, fk.referenced_column),
        ]);
    }
    rows
}

/// Statistics for a schema file.
pub fn schema_info(info: &SchemaInfo, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(info),
        OutputFormat::Csv => to_csv(
            &["Table", "Columns", "ForeignKeys"],
            info.tables.iter().map(|t| {
                vec![
                    t.name.clone(),
                    t.column_count.to_string(),
                    t.foreign_key_count.to_string(),
                ]
            }),
        ),
        OutputFormat::Table => {
            let mut out = String::from("Schema Summary\n");
            let mut summary = TextTable::new(["Metric", "Value"]);
            summary
                .row(["Schema File".to_string(), info.schema_file.clone()])
                .row(["Total Tables".to_string(), info.total_tables.to_string()])
                .row(["Total Columns".to_string(), info.total_columns.to_string()])
                .row(["Foreign Keys".to_string(), info.total_foreign_keys.to_string()])
                .row(["NOT NULL Columns".to_string(), info.not_null_columns.to_string()])
                .row(["Nullable Columns".to_string(), info.nullable_columns.to_string()]);
            out.push_str(&summary.render());

            if !info.data_type_counts.is_empty() {
                out.push_str("\nData Types\n");
                let mut types = TextTable::new(["Data Type", "Count"]);
                for (data_type, count) in &info.data_type_counts {
                    types.row([data_type.clone(), count.to_string()]);
                }
                out.push_str(&types.render());
            }

            if !info.tables.is_empty() {
                out.push_str("\nTables\n");
                let mut tables = TextTable::new(["Table Name", "Columns", "Foreign Keys"]);
                for t in &info.tables {
                    tables.row([
                        t.name.clone(),
                        t.column_count.to_string(),
                        t.foreign_key_count.to_string(),
                    ]);
                }
                out.push_str(&tables.render());
            }
            Ok(out)
        }
    }
}

/// A full schema; JSON output is a schema file with full types.
pub fn schema(schema: &Schema, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let mut json = schema_file::to_json(&schema.with_full_types())?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => {
            let mut rows = Vec::new();
            for table in schema {
                for column in &table.columns {
                    let fk = table
                        .foreign_keys
                        .iter()
                        .find(|fk| fk.column_name == column.column_name);
                    rows.push(vec![
                        table.table_name.clone(),
                        column.column_name.clone(),
                        column.full_type(),
                        column.is_nullable.clone(),
                        column.default_text(),
                        fk.map(|fk| fk.constraint_name.clone()).unwrap_or_default(),
                        fk.map(|fk| fk.referenced_table.clone()).unwrap_or_default(),
                        fk.map(|fk| fk.referenced_column.clone()).unwrap_or_default(),
                    ]);
                }
            }
            to_csv(
                &[
                    "Table",
                    "Column",
                    "DataType",
                    "IsNullable",
                    "DefaultValue",
                    "ConstraintName",
                    "ReferencedTable",
                    "ReferencedColumn",
                ],
                rows,
            )
        }
        OutputFormat::Table => {
            if schema.is_empty() {
                return Ok("No tables found in schema\n".to_string());
            }

            let mut out = format!("Database Schema ({} tables)\n\n", schema.len());
            for table in schema {
                out.push_str(&format!("Table: {}\n", table.table_name));
                let mut columns = TextTable::new(["Column", "Type", "Nullable", "Default"]);
                for column in &table.columns {
                    let default = if column.has_default() {
                        column.default_text()
                    } else {
                        "NULL".to_string()
                    };
                    columns.row([
                        column.column_name.clone(),
                        column.full_type(),
                        column.is_nullable.clone(),
                        default,
                    ]);
                }
                if !columns.is_empty() {
                    out.push_str(&columns.render());
                }

                if !table.foreign_keys.is_empty() {
                    out.push_str(&format!("\nForeign Keys for {}:\n", table.table_name));
                    let mut fks = TextTable::new([
                        "Constraint",
                        "Column",
                        "References",
                        "Update Rule",
                        "Delete Rule",
                    ]);
                    for fk in &table.foreign_keys {
                        fks.row([
                            fk.constraint_name.clone(),
                            fk.column_name.clone(),
                            format!("{}.{}", fk.referenced_table, fk.referenced_column),
                            fk.update_rule.clone(),
                            fk.delete_rule.clone(),
                        ]);
                    }
                    out.push_str(&fks.render());
                }
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Table → column → full type.
pub fn snapshot(snapshot: &SchemaSnapshot, format: OutputFormat) -> CliResult<String> {
    let rows = || {
        snapshot.iter().flat_map(|(table, columns)| {
            columns
                .iter()
                .map(move |(column, ty)| vec![table.clone(), column.clone(), ty.clone()])
        })
    };

    match format {
        OutputFormat::Json => to_json(snapshot),
        OutputFormat::Csv => to_csv(&["Table", "Column", "Type"], rows()),
        OutputFormat::Table => {
            let mut table = TextTable::new(["Table", "Column", "Type"]);
            for row in rows() {
                table.row(row);
            }
            Ok(table.render())
        }
    }
}

/// Per-table repair tallies.
pub fn fix_results(results: &FixResults, mode: SafetyMode, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(results),
        OutputFormat::Csv => to_csv(
            &["Table", "IssuesFound", "RecordsAffected", "Success", "Error"],
            results.iter().map(|(table, r)| {
                vec![
                    table.clone(),
                    r.issues_found.to_string(),
                    r.records_affected.to_string(),
                    r.success.to_string(),
                    r.error.clone().unwrap_or_default(),
                ]
            }),
        ),
        OutputFormat::Table => {
            if results.is_empty() {
                return Ok("Nothing to fix.\n".to_string());
            }

            let affected = if mode.is_dry_run() {
                "Would Affect"
            } else {
                "Records Affected"
            };
            let mut table = TextTable::new(["Table", "Issues Found", affected, "Success", "Error"]);
            for (name, r) in results {
                table.row([
                    name.clone(),
                    r.issues_found.to_string(),
                    r.records_affected.to_string(),
                    r.success.to_string(),
                    r.error.clone().unwrap_or_default(),
                ]);
            }
            Ok(table.render())
        }
    }
}

/// Write `content` to `output`, or to stdout when no file is given.
pub fn emit(content: &str, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaguard_core::{
        Column, FixResult, ForeignKey, IssueKind, Severity, Table, ValidationIssue,
    };

    fn report() -> ValidationReport {
        ValidationReport::new(
            "default",
            vec![
                ValidationIssue::new(
                    IssueKind::ForeignKeyViolation,
                    Severity::Error,
                    "orders",
                    "Foreign key violation: value '99' references non-existent record in customers.id",
                )
                .with_column("customer_id")
                .with_identifier(Some("7".into()))
                .with_offending_value(Some("99".into())),
                ValidationIssue::new(
                    IssueKind::MissingTable,
                    Severity::Warning,
                    "invoices",
                    "Table 'invoices' does not exist in the database",
                ),
            ],
        )
    }

    #[test]
    fn test_text_table_alignment() {
        let mut table = TextTable::new(["a", "long header"]);
        table.row(["wide cell", "x"]);
        assert_eq!(
            table.render(),
            "a          long header\n---------  -----------\nwide cell  x\n"
        );
    }

    #[test]
    fn test_report_table_has_summary() {
        let out = validation_report(&report(), OutputFormat::Table).unwrap();
        assert!(out.contains("ERROR"));
        assert!(out.contains("foreign_key_violation"));
        assert!(out.contains("Total: 2  Errors: 1  Warnings: 1  Tables: 2  Connection: default"));
    }

    #[test]
    fn test_empty_report_table() {
        let empty = ValidationReport::new("default", Vec::new());
        assert_eq!(
            validation_report(&empty, OutputFormat::Table).unwrap(),
            "No validation issues found!\n"
        );
    }

    #[test]
    fn test_report_csv_rows() {
        let out = validation_report(&report(), OutputFormat::Csv).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("Severity,Type,Table,Column,Message,Identifier,OffendingValue")
        );
        assert_eq!(
            lines.next(),
            Some(
                "error,foreign_key_violation,orders,customer_id,\
                 Foreign key violation: value '99' references non-existent record in customers.id,7,99"
            )
        );
    }

    #[test]
    fn test_report_json_uses_type_key() {
        let out = validation_report(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["issues"][0]["type"], "foreign_key_violation");
        assert_eq!(value["summary"]["error_count"], 1);
    }

    #[test]
    fn test_schema_json_uses_full_types() {
        let schema = Schema::new().table(
            Table::new("users")
                .column(Column::new("email", "character varying", false).with_length(50)),
        );
        let out = super::schema(&schema, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["Columns"][0]["DataType"], "character varying(50)");
        assert_eq!(value[0]["Columns"][0]["CharacterMaxLength"], 50);
    }

    #[test]
    fn test_schema_table_shows_null_only_without_default() {
        let schema = Schema::new().table(
            Table::new("users")
                .column(Column::new("nickname", "text", true).with_default(""))
                .column(Column::new("bio", "text", true)),
        );
        let out = super::schema(&schema, OutputFormat::Table).unwrap();
        let line = |name: &str| {
            out.lines()
                .find(|l| l.starts_with(name))
                .map(str::trim_end)
                .unwrap()
                .to_string()
        };
        assert!(line("nickname").ends_with("YES"));
        assert!(line("bio").ends_with("NULL"));
    }

    #[test]
    fn test_schema_csv_joins_foreign_keys() {
        let schema = Schema::new().table(
            Table::new("orders")
                .column(Column::new("customer_id", "integer", true))
                .foreign_key(ForeignKey::new("fk", "orders", "customer_id", "customers", "id")),
        );
        let out = super::schema(&schema, OutputFormat::Csv).unwrap();
        assert!(out.ends_with("orders,customer_id,integer,YES,,fk,customers,id\n"));
    }

    #[test]
    fn test_fix_results_dry_run_header() {
        let mut results = FixResults::new();
        results.insert(
            "orders".to_string(),
            FixResult {
                issues_found: 3,
                records_affected: 3,
                ..FixResult::default()
            },
        );
        let out = fix_results(&results, SafetyMode::DryRun, OutputFormat::Table).unwrap();
        assert!(out.starts_with("Table   Issues Found  Would Affect  Success  Error\n"));
        assert!(out.contains("orders  3             3             true"));
    }

    #[test]
    fn test_emit_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("out.json");
        emit("{}\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
