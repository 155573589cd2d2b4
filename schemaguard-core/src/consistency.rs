//! Self-consistency checks on a single schema, with no database involved.

use std::collections::HashSet;

use crate::model::Schema;
use crate::validate::{IssueKind, Severity, ValidationIssue};

/// Scan `schema` for duplicate names, incomplete columns and foreign keys
/// that point outside the schema.
///
/// Each repeat of a name after its first occurrence yields one issue.
pub fn validate_schema(schema: &Schema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut table_names = HashSet::new();

    for table in schema {
        if !table_names.insert(table.table_name.as_str()) {
            issues.push(ValidationIssue::new(
                IssueKind::DuplicateTable,
                Severity::Error,
                &table.table_name,
                format!("Duplicate table name: {}", table.table_name),
            ));
        }

        let mut column_names = HashSet::new();
        for column in &table.columns {
            if !column_names.insert(column.column_name.as_str()) {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::DuplicateColumn,
                        Severity::Error,
                        &table.table_name,
                        format!(
                            "Duplicate column name: {} in table {}",
                            column.column_name, table.table_name
                        ),
                    )
                    .with_column(&column.column_name),
                );
            }

            if column.column_name.is_empty() {
                issues.push(ValidationIssue::new(
                    IssueKind::InvalidColumn,
                    Severity::Error,
                    &table.table_name,
                    "Column with empty name found",
                ));
            }

            if column.data_type.is_empty() {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::InvalidColumn,
                        Severity::Error,
                        &table.table_name,
                        format!("Column {} has no data type", column.column_name),
                    )
                    .with_column(&column.column_name),
                );
            }
        }

        for fk in &table.foreign_keys {
            match schema.get_table(&fk.referenced_table) {
                None => issues.push(
                    ValidationIssue::new(
                        IssueKind::InvalidForeignKey,
                        Severity::Warning,
                        &table.table_name,
                        format!(
                            "Foreign key references non-existent table: {}",
                            fk.referenced_table
                        ),
                    )
                    .with_column(&fk.column_name)
                    .with_detail("constraint_name", fk.constraint_name.as_str())
                    .with_detail("referenced_table", fk.referenced_table.as_str())
                    .with_detail("referenced_column", fk.referenced_column.as_str()),
                ),
                Some(referenced) if referenced.get_column(&fk.referenced_column).is_none() => {
                    issues.push(
                        ValidationIssue::new(
                            IssueKind::InvalidForeignKey,
                            Severity::Warning,
                            &table.table_name,
                            format!(
                                "Foreign key references non-existent column: {}.{}",
                                fk.referenced_table, fk.referenced_column
                            ),
                        )
                        .with_column(&fk.column_name)
                        .with_detail("constraint_name", fk.constraint_name.as_str())
                        .with_detail("referenced_table", fk.referenced_table.as_str())
                        .with_detail("referenced_column", fk.referenced_column.as_str()),
                    )
                }
                Some(_) => {}
            }

            if table.get_column(&fk.column_name).is_none() {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::InvalidForeignKey,
                        Severity::Error,
                        &table.table_name,
                        format!(
                            "Foreign key references non-existent source column: {}",
                            fk.column_name
                        ),
                    )
                    .with_column(&fk.column_name)
                    .with_detail("constraint_name", fk.constraint_name.as_str()),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ForeignKey, Table};
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", "integer", false))
            .column(Column::new("email", "text", false))
    }

    #[test]
    fn test_clean_schema() {
        let schema = Schema::new().table(users()).table(
            Table::new("posts")
                .column(Column::new("id", "integer", false))
                .column(Column::new("author_id", "integer", false))
                .foreign_key(ForeignKey::new("fk_author", "posts", "author_id", "users", "id")),
        );
        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_duplicate_table() {
        let schema = Schema::new().table(users()).table(users());
        let issues = validate_schema(&schema);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateTable);
        assert_eq!(issues[0].table, "users");
    }

    #[test]
    fn test_invalid_columns() {
        let schema = Schema::new().table(
            Table::new("t")
                .column(Column::new("a", "text", true))
                .column(Column::new("a", "text", true))
                .column(Column::new("", "text", true))
                .column(Column::new("b", "", true)),
        );
        let kinds: Vec<_> = validate_schema(&schema).iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::DuplicateColumn,
                IssueKind::InvalidColumn,
                IssueKind::InvalidColumn
            ]
        );
    }

    #[test]
    fn test_dangling_foreign_keys() {
        let schema = Schema::new().table(users()).table(
            Table::new("posts")
                .column(Column::new("id", "integer", false))
                .foreign_key(ForeignKey::new("fk_author", "posts", "author_id", "users", "uuid"))
                .foreign_key(ForeignKey::new("fk_topic", "posts", "id", "topics", "id")),
        );

        let issues = validate_schema(&schema);
        let summary: Vec<_> = issues
            .iter()
            .map(|i| (i.kind, i.severity, i.message.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    IssueKind::InvalidForeignKey,
                    Severity::Warning,
                    "Foreign key references non-existent column: users.uuid".to_string()
                ),
                (
                    IssueKind::InvalidForeignKey,
                    Severity::Error,
                    "Foreign key references non-existent source column: author_id".to_string()
                ),
                (
                    IssueKind::InvalidForeignKey,
                    Severity::Warning,
                    "Foreign key references non-existent table: topics".to_string()
                ),
            ]
        );
    }
}
