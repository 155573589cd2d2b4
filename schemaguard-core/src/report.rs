//! Report values built from engine results.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Schema;
use crate::validate::{Severity, ValidationIssue};

/// Issues from one validation run with summary counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub connection_name: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub issues: Vec<ValidationIssue>,
    pub summary: ReportSummary,
}

/// Counts over a report's issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_issues: usize,
    pub error_count: usize,
    pub warning_count: usize,
    /// Distinct tables with at least one issue.
    pub tables_covered: usize,
    pub issues_by_type: BTreeMap<String, usize>,
}

impl ValidationReport {
    /// Build a report stamped with the current time.
    pub fn new(connection_name: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            connection_name: connection_name.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            summary: ReportSummary::from_issues(&issues),
            issues,
        }
    }

    /// Whether any issue has error severity.
    pub fn has_errors(&self) -> bool {
        self.summary.error_count > 0
    }
}

impl ReportSummary {
    /// Count `issues`.
    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        let mut summary = Self {
            total_issues: issues.len(),
            ..Self::default()
        };
        let mut tables = BTreeSet::new();

        for issue in issues {
            match issue.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
            }
            tables.insert(issue.table.as_str());
            *summary
                .issues_by_type
                .entry(issue.kind.as_str().to_string())
                .or_default() += 1;
        }

        summary.tables_covered = tables.len();
        summary
    }
}

/// Shape statistics for a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Where the schema came from.
    pub schema_file: String,
    pub total_tables: usize,
    pub total_columns: usize,
    pub total_foreign_keys: usize,
    pub not_null_columns: usize,
    pub nullable_columns: usize,
    /// Base data type → column count.
    pub data_type_counts: BTreeMap<String, usize>,
    pub tables: Vec<TableSummary>,
}

/// Per-table counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub column_count: usize,
    pub foreign_key_count: usize,
}

impl SchemaInfo {
    /// Gather statistics for `schema`.
    pub fn from_schema(source: impl Into<String>, schema: &Schema) -> Self {
        let mut info = Self {
            schema_file: source.into(),
            total_tables: schema.len(),
            ..Self::default()
        };

        for table in schema {
            info.total_columns += table.columns.len();
            info.total_foreign_keys += table.foreign_keys.len();

            for column in &table.columns {
                if column.is_not_null() {
                    info.not_null_columns += 1;
                } else {
                    info.nullable_columns += 1;
                }
                *info
                    .data_type_counts
                    .entry(column.data_type.clone())
                    .or_default() += 1;
            }

            info.tables.push(TableSummary {
                name: table.table_name.clone(),
                column_count: table.columns.len(),
                foreign_key_count: table.foreign_keys.len(),
            });
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ForeignKey, Table};
    use crate::validate::IssueKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_summary() {
        let issues = vec![
            ValidationIssue::new(IssueKind::MissingTable, Severity::Warning, "invoices", "gone"),
            ValidationIssue::new(IssueKind::ForeignKeyViolation, Severity::Error, "orders", "a"),
            ValidationIssue::new(IssueKind::ForeignKeyViolation, Severity::Error, "orders", "b"),
        ];
        let report = ValidationReport::new("default", issues);

        assert_eq!(report.summary.total_issues, 3);
        assert_eq!(report.summary.error_count, 2);
        assert_eq!(report.summary.warning_count, 1);
        assert_eq!(report.summary.tables_covered, 2);
        assert_eq!(report.summary.issues_by_type["foreign_key_violation"], 2);
        assert!(report.has_errors());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn test_schema_info() {
        let schema = Schema::new()
            .table(
                Table::new("customers")
                    .column(Column::new("id", "integer", false))
                    .column(Column::new("name", "text", true)),
            )
            .table(
                Table::new("orders")
                    .column(Column::new("id", "integer", false))
                    .column(Column::new("customer_id", "integer", true))
                    .foreign_key(ForeignKey::new("fk", "orders", "customer_id", "customers", "id")),
            );

        let info = SchemaInfo::from_schema("schema.json", &schema);
        assert_eq!(info.total_tables, 2);
        assert_eq!(info.total_columns, 4);
        assert_eq!(info.total_foreign_keys, 1);
        assert_eq!(info.not_null_columns, 2);
        assert_eq!(info.nullable_columns, 2);
        assert_eq!(info.data_type_counts["integer"], 3);
        assert_eq!(info.tables[1].foreign_key_count, 1);
    }
}
