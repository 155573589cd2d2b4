//! In-memory schema model shared by the introspector, differ and validator.
//!
//! Field names serialize in the PascalCase vocabulary used by schema files,
//! and `IsNullable` keeps the literal `"YES"`/`"NO"` strings so hand-authored
//! files round-trip unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Value of `IsNullable` for a column that rejects nulls.
pub const NOT_NULLABLE: &str = "NO";

/// Value of `IsNullable` for a column that accepts nulls.
pub const NULLABLE: &str = "YES";

/// Vendor sentinel for "unbounded" character length.
pub const UNBOUNDED_LENGTH: i32 = i32::MAX;

/// A column as read from the catalog or a schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Column {
    /// Column name.
    pub column_name: String,
    /// Base data type as the vendor reports it (e.g. `character varying`).
    pub data_type: String,
    /// Default value; catalog defaults are strings, authored files may use any JSON value.
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    /// `"YES"` or `"NO"`.
    pub is_nullable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_max_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_precision: Option<i32>,
}

impl Column {
    /// Create a column with no default and no size metadata.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            column_name: name.into(),
            data_type: data_type.into(),
            default_value: None,
            is_nullable: if nullable { NULLABLE } else { NOT_NULLABLE }.to_string(),
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            datetime_precision: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the character maximum length.
    pub fn with_length(mut self, length: i32) -> Self {
        self.character_max_length = Some(length);
        self
    }

    /// Set numeric precision and scale.
    pub fn with_precision(mut self, precision: i32, scale: Option<i32>) -> Self {
        self.numeric_precision = Some(precision);
        self.numeric_scale = scale;
        self
    }

    /// Set datetime precision.
    pub fn with_datetime_precision(mut self, precision: i32) -> Self {
        self.datetime_precision = Some(precision);
        self
    }

    /// Whether the column is declared NOT NULL.
    pub fn is_not_null(&self) -> bool {
        self.is_nullable == NOT_NULLABLE
    }

    /// The base type with its size suffix, e.g. `character varying(50)` or `numeric(10,2)`.
    ///
    /// Missing, non-positive and unbounded sizes are left off.
    pub fn full_type(&self) -> String {
        let data_type = self.data_type.as_str();

        if let Some(length) = positive(self.character_max_length)
            && matches!(
                data_type,
                "character varying" | "varchar" | "char" | "character" | "text"
            )
            && length < UNBOUNDED_LENGTH
        {
            return format!("{}({})", data_type, length);
        }

        if let Some(precision) = positive(self.numeric_precision)
            && matches!(data_type, "numeric" | "decimal" | "money")
        {
            return match positive(self.numeric_scale) {
                Some(scale) => format!("{}({},{})", data_type, precision, scale),
                None => format!("{}({})", data_type, precision),
            };
        }

        if let Some(precision) = positive(self.datetime_precision)
            && matches!(data_type, "timestamp" | "time" | "interval")
        {
            return format!("{}({})", data_type, precision);
        }

        data_type.to_string()
    }

    /// Whether a default is declared; a JSON `null` counts as none.
    pub fn has_default(&self) -> bool {
        !matches!(self.default_value, None | Some(serde_json::Value::Null))
    }

    /// The default value in the string form used for comparisons.
    ///
    /// Strings compare by their content and other JSON values by their
    /// serialized text, so `0` and `0.0` stay distinct. No default renders as
    /// an empty string; pair with [`Column::has_default`] to tell it apart
    /// from an empty-string default.
    pub fn default_text(&self) -> String {
        match &self.default_value {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn positive(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v > 0)
}

/// A single-column foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForeignKey {
    /// Constraint name.
    #[serde(default)]
    pub constraint_name: String,
    /// Owning table.
    pub table_name: String,
    /// Owning column.
    pub column_name: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
    #[serde(default)]
    pub update_rule: String,
    #[serde(default)]
    pub delete_rule: String,
}

impl ForeignKey {
    /// Create a foreign key with `NO ACTION` rules.
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: name.into(),
            table_name: table.into(),
            column_name: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            update_rule: "NO ACTION".to_string(),
            delete_rule: "NO ACTION".to_string(),
        }
    }

    /// Identity used by the differ: `table.column->refTable.refColumn`.
    ///
    /// Constraint names and referential rules are not part of it.
    pub fn identity(&self) -> String {
        format!(
            "{}.{}->{}.{}",
            self.table_name, self.column_name, self.referenced_table, self.referenced_column
        )
    }
}

/// A table with its ordered columns and foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Table {
    /// Table name.
    pub table_name: String,
    /// Columns in ordinal order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub columns: Vec<Column>,
    /// Foreign keys owned by this table.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table_name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a foreign key.
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Look up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

/// An ordered collection of tables; serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from tables, keeping their order.
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Append a table.
    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Builder-style append.
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Tables in order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Iterate over tables.
    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// First table with the given name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    /// Table name → column name → full type.
    pub fn snapshot(&self) -> SchemaSnapshot {
        self.tables
            .iter()
            .map(|table| {
                let columns = table
                    .columns
                    .iter()
                    .map(|c| (c.column_name.clone(), c.full_type()))
                    .collect();
                (table.table_name.clone(), columns)
            })
            .collect()
    }

    /// Copy of the schema with each `DataType` replaced by its full type.
    ///
    /// Size fields are kept alongside for reference.
    pub fn with_full_types(&self) -> Schema {
        let tables = self
            .tables
            .iter()
            .map(|table| Table {
                columns: table
                    .columns
                    .iter()
                    .map(|c| Column {
                        data_type: c.full_type(),
                        ..c.clone()
                    })
                    .collect(),
                ..table.clone()
            })
            .collect();
        Schema { tables }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

impl FromIterator<Table> for Schema {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

/// Simplified export: table → column → full type, in schema order.
pub type SchemaSnapshot = IndexMap<String, IndexMap<String, String>>;

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_type_varchar() {
        let col = Column::new("name", "character varying", true).with_length(50);
        assert_eq!(col.full_type(), "character varying(50)");
    }

    #[test]
    fn test_full_type_unbounded_length() {
        let col = Column::new("body", "character varying", true).with_length(2147483647);
        assert_eq!(col.full_type(), "character varying");
    }

    #[test]
    fn test_full_type_numeric() {
        let col = Column::new("price", "numeric", false).with_precision(10, Some(2));
        assert_eq!(col.full_type(), "numeric(10,2)");

        let col = Column::new("qty", "numeric", false).with_precision(12, Some(0));
        assert_eq!(col.full_type(), "numeric(12)");
    }

    #[test]
    fn test_full_type_timestamp() {
        let col = Column::new("created_at", "timestamp", false).with_datetime_precision(3);
        assert_eq!(col.full_type(), "timestamp(3)");
    }

    #[test]
    fn test_full_type_ignores_unrelated_sizes() {
        // integer reports a numeric precision but never takes a suffix
        let col = Column::new("id", "integer", false).with_precision(32, Some(0));
        assert_eq!(col.full_type(), "integer");
    }

    #[test]
    fn test_default_text() {
        let col = Column::new("n", "integer", true);
        assert_eq!(col.default_text(), "");
        assert!(!col.has_default());
        assert!(!col.clone().with_default(serde_json::Value::Null).has_default());
        assert!(col.clone().with_default("").has_default());
        assert_eq!(col.clone().with_default("0").default_text(), "0");
        assert_eq!(col.clone().with_default(0).default_text(), "0");
        assert_eq!(
            col.with_default(serde_json::json!(0.0)).default_text(),
            "0.0"
        );
    }

    #[test]
    fn test_schema_json_shape() {
        let json = r#"[
            {
                "TableName": "orders",
                "Columns": [
                    {"ColumnName": "id", "DataType": "integer", "DefaultValue": null, "IsNullable": "NO"},
                    {"ColumnName": "note", "DataType": "character varying", "DefaultValue": "n/a",
                     "IsNullable": "YES", "CharacterMaxLength": 200}
                ],
                "ForeignKeys": null
            }
        ]"#;

        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.len(), 1);
        let orders = schema.get_table("orders").unwrap();
        assert!(orders.foreign_keys.is_empty());
        assert!(orders.get_column("id").unwrap().is_not_null());
        assert_eq!(
            orders.get_column("note").unwrap().full_type(),
            "character varying(200)"
        );

        let out = serde_json::to_value(&schema).unwrap();
        assert_eq!(out[0]["Columns"][1]["IsNullable"], "YES");
        assert!(out[0]["Columns"][0].get("CharacterMaxLength").is_none());
    }

    #[test]
    fn test_snapshot_keeps_order() {
        let schema = Schema::new()
            .table(
                Table::new("users")
                    .column(Column::new("id", "integer", false))
                    .column(Column::new("email", "varchar", false).with_length(255)),
            )
            .table(Table::new("audit"));

        let snapshot = schema.snapshot();
        let tables: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(tables, vec!["users", "audit"]);
        assert_eq!(snapshot["users"]["email"], "varchar(255)");
        assert!(snapshot["audit"].is_empty());
    }

    #[test]
    fn test_fk_identity_ignores_name_and_rules() {
        let a = ForeignKey::new("fk_a", "orders", "customer_id", "customers", "id");
        let mut b = ForeignKey::new("fk_b", "orders", "customer_id", "customers", "id");
        b.delete_rule = "CASCADE".to_string();
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity(), "orders.customer_id->customers.id");
    }
}
