//! Offline workflows over schema files: loading, self-consistency checks,
//! summaries, snapshots and file-to-file comparison.

use pretty_assertions::assert_eq;

use schemaguard::{IssueKind, SchemaInfo, Severity, compare, schema_file, validate_schema};

const TARGET: &str = r#"[
  {
    "TableName": "customers",
    "Columns": [
      {"ColumnName": "id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"},
      {"ColumnName": "email", "DataType": "character varying", "DefaultValue": null,
       "IsNullable": "NO", "CharacterMaxLength": 255}
    ],
    "ForeignKeys": null
  },
  {
    "TableName": "orders",
    "Columns": [
      {"ColumnName": "id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"},
      {"ColumnName": "customer_id", "DataType": "integer", "DefaultValue": null, "IsNullable": "YES"},
      {"ColumnName": "total", "DataType": "numeric", "DefaultValue": "0",
       "IsNullable": "NO", "NumericPrecision": 10, "NumericScale": 2}
    ],
    "ForeignKeys": [
      {"ConstraintName": "orders_customer_id_fkey", "TableName": "orders",
       "ColumnName": "customer_id", "ReferencedTable": "customers", "ReferencedColumn": "id",
       "UpdateRule": "NO ACTION", "DeleteRule": "CASCADE"}
    ]
  }
]"#;

/// A well-formed file loads and passes the consistency check.
#[tokio::test]
async fn test_load_and_validate_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    std::fs::write(&path, TARGET).unwrap();

    let schema = schema_file::load(&path).await.unwrap();
    assert_eq!(schema.len(), 2);
    assert!(validate_schema(&schema).is_empty());
}

/// Info and snapshot report full types in file order.
#[test]
fn test_info_and_snapshot() {
    let schema = schema_file::parse(TARGET).unwrap();

    let info = SchemaInfo::from_schema("schema.json", &schema);
    assert_eq!(info.total_tables, 2);
    assert_eq!(info.total_columns, 5);
    assert_eq!(info.data_type_counts["integer"], 3);
    assert_eq!(info.tables[1].name, "orders");
    assert_eq!(info.tables[1].column_count, 3);
    assert_eq!(info.tables[1].foreign_key_count, 1);

    let snapshot = schema.snapshot();
    assert_eq!(snapshot["customers"]["email"], "character varying(255)");
    assert_eq!(snapshot["orders"]["total"], "numeric(10,2)");
}

/// A broken file reports each structural problem.
#[test]
fn test_validate_broken_file() {
    let json = r#"[
      {"TableName": "a", "Columns": [
        {"ColumnName": "id", "DataType": "integer", "IsNullable": "NO"},
        {"ColumnName": "id", "DataType": "integer", "IsNullable": "NO"},
        {"ColumnName": "", "DataType": "text", "IsNullable": "YES"}
      ], "ForeignKeys": [
        {"ConstraintName": "a_b", "TableName": "a", "ColumnName": "b_id",
         "ReferencedTable": "b", "ReferencedColumn": "id"}
      ]},
      {"TableName": "a", "Columns": []}
    ]"#;
    let schema = schema_file::parse(json).unwrap();

    let kinds: Vec<_> = validate_schema(&schema).into_iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::DuplicateTable));
    assert!(kinds.contains(&IssueKind::DuplicateColumn));
    assert!(kinds.contains(&IssueKind::InvalidColumn));
    assert!(kinds.contains(&IssueKind::InvalidForeignKey));
}

/// Comparing two files finds the dropped column and the changed nullability.
///
/// A size-only change is not drift.
#[tokio::test]
async fn test_compare_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = schema_file::parse(TARGET).unwrap();

    let mut tables = target.tables().to_vec();
    tables[1].columns.pop();
    tables[0].columns[1].character_max_length = Some(100);
    tables[0].columns[0].is_nullable = "YES".to_string();
    let current = schemaguard::Schema::from_tables(tables);

    let current_path = dir.path().join("current").join("schema.json");
    schema_file::save(&current_path, &current).await.unwrap();
    let reloaded = schema_file::load(&current_path).await.unwrap();
    assert_eq!(reloaded, current);

    let comparison = compare(&reloaded, &target);
    assert!(!comparison.is_empty());
    assert_eq!(
        comparison.table_differences["orders"].missing_columns[0].column_name,
        "total"
    );
    let customers = &comparison.table_differences["customers"];
    let modified: Vec<_> = customers.modified_columns.keys().cloned().collect();
    assert_eq!(modified, vec!["id"]);
    assert_eq!(customers.modified_columns["id"].current.is_nullable, "YES");
}

/// Invalid JSON surfaces as an error, not an empty schema.
#[test]
fn test_invalid_json_is_an_error() {
    assert!(schema_file::parse("{not json").is_err());
    assert!(schema_file::parse(r#"{"TableName": "a"}"#).is_err());
}

/// Severity of a missing referenced table in a file is a warning.
#[test]
fn test_dangling_reference_is_warning() {
    let json = r#"[{"TableName": "a", "Columns": [
        {"ColumnName": "b_id", "DataType": "integer", "IsNullable": "YES"}
      ], "ForeignKeys": [
        {"ConstraintName": "a_b", "TableName": "a", "ColumnName": "b_id",
         "ReferencedTable": "b", "ReferencedColumn": "id"}
      ]}]"#;
    let issues = validate_schema(&schema_file::parse(json).unwrap());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::InvalidForeignKey);
    assert_eq!(issues[0].severity, Severity::Warning);
}
