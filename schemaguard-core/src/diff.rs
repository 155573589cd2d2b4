//! Structural comparison of a live schema against a target schema.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Column, ForeignKey, Schema, Table};

/// Differences between the current (live) and target (authored) schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaComparison {
    /// Tables in the target that the current schema lacks.
    pub missing_tables: Vec<String>,
    /// Tables in the current schema that the target lacks.
    pub extra_tables: Vec<String>,
    /// Per-table drift. A table with no drift has no entry.
    pub table_differences: IndexMap<String, TableDifference>,
}

impl SchemaComparison {
    /// Whether the two schemas match structurally.
    pub fn is_empty(&self) -> bool {
        self.missing_tables.is_empty()
            && self.extra_tables.is_empty()
            && self.table_differences.is_empty()
    }

    /// Get a human-readable summary of the comparison.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.missing_tables.is_empty() {
            parts.push(format!("{} missing tables", self.missing_tables.len()));
        }
        if !self.extra_tables.is_empty() {
            parts.push(format!("{} extra tables", self.extra_tables.len()));
        }
        if !self.table_differences.is_empty() {
            parts.push(format!(
                "{} tables with differences",
                self.table_differences.len()
            ));
        }

        if parts.is_empty() {
            "No differences".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Column and foreign key drift within one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDifference {
    /// Target columns the current table lacks.
    pub missing_columns: Vec<Column>,
    /// Current columns the target table lacks.
    pub extra_columns: Vec<Column>,
    /// Columns whose type, nullability or default differ, by name.
    pub modified_columns: IndexMap<String, ColumnDiff>,
    /// Foreign key drift.
    pub foreign_key_diffs: ForeignKeyDifference,
}

impl TableDifference {
    /// Whether there is no drift at all.
    pub fn is_empty(&self) -> bool {
        self.missing_columns.is_empty()
            && self.extra_columns.is_empty()
            && self.modified_columns.is_empty()
            && self.foreign_key_diffs.is_empty()
    }
}

/// Both sides of a modified column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiff {
    /// The column as it exists in the database.
    pub current: Column,
    /// The column as the schema file declares it.
    pub target: Column,
}

/// Foreign keys present on only one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDifference {
    /// In the target only.
    pub missing: Vec<ForeignKey>,
    /// In the current schema only.
    pub extra: Vec<ForeignKey>,
}

impl ForeignKeyDifference {
    /// Whether both sides agree.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compare `current` against `target`.
///
/// Tables and columns match by name. Columns are modified when their data
/// type, nullability or default text differ; defaults compare as strings, so
/// `0` and `0.0` differ. Foreign keys match by column mapping only.
pub fn compare(current: &Schema, target: &Schema) -> SchemaComparison {
    let current_tables = by_name(current);
    let target_tables = by_name(target);

    let mut comparison = SchemaComparison::default();

    for table in target {
        if !current_tables.contains_key(table.table_name.as_str())
            && !comparison.missing_tables.contains(&table.table_name)
        {
            comparison.missing_tables.push(table.table_name.clone());
        }
    }

    for table in current {
        if !target_tables.contains_key(table.table_name.as_str())
            && !comparison.extra_tables.contains(&table.table_name)
        {
            comparison.extra_tables.push(table.table_name.clone());
        }
    }

    for table in current {
        let name = table.table_name.as_str();
        if comparison.table_differences.contains_key(name) {
            continue;
        }
        let (Some(current_table), Some(target_table)) =
            (current_tables.get(name), target_tables.get(name))
        else {
            continue;
        };

        let diff = compare_tables(current_table, target_table);
        if !diff.is_empty() {
            comparison.table_differences.insert(name.to_string(), diff);
        }
    }

    comparison
}

/// Name → table; the last table with a name wins.
fn by_name(schema: &Schema) -> HashMap<&str, &Table> {
    schema
        .iter()
        .map(|table| (table.table_name.as_str(), table))
        .collect()
}

fn compare_tables(current: &Table, target: &Table) -> TableDifference {
    let current_columns: HashMap<&str, &Column> = current
        .columns
        .iter()
        .map(|c| (c.column_name.as_str(), c))
        .collect();
    let target_columns: HashMap<&str, &Column> = target
        .columns
        .iter()
        .map(|c| (c.column_name.as_str(), c))
        .collect();

    let mut diff = TableDifference::default();

    for column in &target.columns {
        match current_columns.get(column.column_name.as_str()) {
            None => diff.missing_columns.push(column.clone()),
            Some(current_column) => {
                if column_changed(current_column, column) {
                    diff.modified_columns.insert(
                        column.column_name.clone(),
                        ColumnDiff {
                            current: (*current_column).clone(),
                            target: column.clone(),
                        },
                    );
                }
            }
        }
    }

    for column in &current.columns {
        if !target_columns.contains_key(column.column_name.as_str()) {
            diff.extra_columns.push(column.clone());
        }
    }

    diff.foreign_key_diffs = compare_foreign_keys(&current.foreign_keys, &target.foreign_keys);
    diff
}

fn column_changed(current: &Column, target: &Column) -> bool {
    current.data_type != target.data_type
        || current.is_nullable != target.is_nullable
        || current.has_default() != target.has_default()
        || current.default_text() != target.default_text()
}

fn compare_foreign_keys(current: &[ForeignKey], target: &[ForeignKey]) -> ForeignKeyDifference {
    let current_keys: HashSet<String> = current.iter().map(ForeignKey::identity).collect();
    let target_keys: HashSet<String> = target.iter().map(ForeignKey::identity).collect();

    let mut seen = HashSet::new();
    let missing = target
        .iter()
        .filter(|fk| {
            let key = fk.identity();
            !current_keys.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let extra = current
        .iter()
        .filter(|fk| {
            let key = fk.identity();
            !target_keys.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect();

    ForeignKeyDifference { missing, extra }
}
