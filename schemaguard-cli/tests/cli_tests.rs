//! Integration tests for the SchemaGuard CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SCHEMA: &str = r#"[
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
      {"ColumnName": "customer_id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"}
    ],
    "ForeignKeys": [
      {"ConstraintName": "orders_customer_id_fkey", "TableName": "orders",
       "ColumnName": "customer_id", "ReferencedTable": "customers", "ReferencedColumn": "id"}
    ]
  }
]"#;

const BROKEN_SCHEMA: &str = r#"[
  {
    "TableName": "orders",
    "Columns": [
      {"ColumnName": "id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"},
      {"ColumnName": "id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"}
    ],
    "ForeignKeys": null
  }
]"#;

const CONFIG: &str = r#"
[database.default]
type = "postgres"
host = "localhost"
port = 5432
username = "app"
password = "hunter2"
database = "shop"

[[database.connections]]
name = "reporting"
type = "mysql"
host = "reports.internal"
port = 3306
database = "analytics"
"#;

/// Get the schemaguard binary
#[allow(deprecated)]
fn schemaguard_cmd() -> Command {
    Command::cargo_bin("schemaguard").unwrap()
}

fn write_schema(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("schema.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_command() {
    schemaguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schemaguard"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("schema"))
        .stdout(predicate::str::contains("fix"))
        .stdout(predicate::str::contains("connection"));
}

#[test]
fn test_version_command() {
    schemaguard_cmd()
        .arg("version")
        .assert()
        .success()
        .stderr(predicate::str::contains("Version"))
        .stderr(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_fix_help_mentions_confirm() {
    schemaguard_cmd()
        .args(["fix", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--confirm"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_schema_validate_clean_file() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, SCHEMA);

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "validate", "--schema"])
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("No validation issues found!"))
        .stderr(predicate::str::contains("Schema file is valid!"))
        .stderr(predicate::str::contains("Found 2 tables in schema"));
}

#[test]
fn test_schema_validate_uses_default_file_name() {
    let dir = TempDir::new().unwrap();
    write_schema(&dir, SCHEMA);

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Schema file is valid!"));
}

#[test]
fn test_schema_validate_broken_file_fails() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, BROKEN_SCHEMA);

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "validate", "--format", "json", "--schema"])
        .arg(&schema)
        .assert()
        .failure()
        .stdout(predicate::str::contains("duplicate_column"))
        .stderr(predicate::str::contains("validation issues in schema file"));
}

#[test]
fn test_schema_info_table_and_json() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, SCHEMA);

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "info", "--schema"])
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Tables"))
        .stdout(predicate::str::contains("orders"));

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "stats", "-f", "json", "--schema"])
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_tables\": 2"))
        .stdout(predicate::str::contains("\"total_foreign_keys\": 1"));
}

#[test]
fn test_schema_info_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, SCHEMA);
    let out = dir.path().join("reports").join("info.csv");

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "info", "-f", "csv", "--schema"])
        .arg(&schema)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved to:"));

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("Table,Columns,ForeignKeys"));
    assert!(content.contains("customers,2,0"));
}

#[test]
fn test_missing_schema_file() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Schema file not found"));
}

#[test]
fn test_invalid_schema_json() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "{ not json");

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["schema", "info", "--schema"])
        .arg(&schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

#[test]
fn test_fix_requires_action() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["fix", "fk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--action is required"));
}

#[test]
fn test_fix_rejects_unknown_action() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["fix", "fk", "--action", "truncate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid action: truncate"));
}

#[test]
fn test_fix_set_default_needs_value() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["fix", "null", "--action", "set-default"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--default-value is required"));
}

#[test]
fn test_fix_without_dry_run_needs_confirm() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["fix", "fk", "--action", "remove", "--dry-run=false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use --confirm"));
}

#[test]
fn test_connection_list() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schemaguard.toml"), CONFIG).unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["connection", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default"))
        .stdout(predicate::str::contains("reporting"))
        .stdout(predicate::str::contains("reports.internal"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_connection_list_json_with_explicit_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, CONFIG).unwrap();

    schemaguard_cmd()
        .args(["conn", "ls", "--format", "json", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"reporting\""))
        .stdout(predicate::str::contains("\"type\": \"mysql\""));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["connection", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unknown_connection_name() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schemaguard.toml"), CONFIG).unwrap();

    schemaguard_cmd()
        .current_dir(dir.path())
        .args(["connection", "info", "-c", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
}
