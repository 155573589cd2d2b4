//! Live database handle and catalog introspection.

use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::dialect::{DatabaseType, Dialect, RowIdentifier};
use crate::error::{CoreError, CoreResult};
use crate::executor::{Executor, TextRow};
use crate::model::{Column, ForeignKey, Schema, Table};

/// Candidate identifier column names, in precedence order. `{table}` stands
/// for the table's own name.
const IDENTIFIER_CANDIDATES: &[&str] = &["id", "{table}_id", "uuid", "guid", "key"];

/// An open connection paired with the dialect that speaks to it.
///
/// Owned by one command for its lifetime; call [`Database::close`] when done.
pub struct Database {
    dialect: &'static dyn Dialect,
    executor: Box<dyn Executor>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Connect and ping. The connection is released if the ping fails.
    pub async fn connect(config: &DbConfig) -> CoreResult<Self> {
        let db_type: DatabaseType = config.db_type.parse()?;
        let dialect = db_type.dialect();
        let conn_str = dialect.build_connection_string(config)?;

        debug!(
            driver = dialect.driver_name(),
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting"
        );

        let executor = open_executor(db_type, &conn_str).await?;
        let mut db = Self { dialect, executor };

        if let Err(e) = db.executor.ping().await {
            if let Err(close_err) = db.close().await {
                warn!(error = %close_err, "Failed to close connection after ping failure");
            }
            return Err(CoreError::connection(format!("failed to ping database: {}", e)));
        }

        info!(
            driver = dialect.driver_name(),
            target = %config.display_target(),
            "Connected to database"
        );
        Ok(db)
    }

    /// Wrap an already-open executor.
    pub fn with_executor(db_type: DatabaseType, executor: impl Executor + 'static) -> Self {
        Self {
            dialect: db_type.dialect(),
            executor: Box::new(executor),
        }
    }

    /// Release the connection.
    pub async fn close(self) -> CoreResult<()> {
        debug!(driver = self.dialect.driver_name(), "Closing connection");
        self.executor.close().await
    }

    /// The vendor behind this connection.
    pub fn database_type(&self) -> DatabaseType {
        self.dialect.database_type()
    }

    /// The dialect used for every statement.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub(crate) async fn query(&mut self, sql: &str, params: &[&str]) -> CoreResult<Vec<TextRow>> {
        self.executor.query(sql, params).await
    }

    pub(crate) async fn execute(&mut self, sql: &str) -> CoreResult<u64> {
        self.executor.execute(sql).await
    }

    /// Read every base table with its columns and foreign keys.
    ///
    /// Any catalog failure aborts the whole read.
    pub async fn get_current_schema(&mut self) -> CoreResult<Schema> {
        let names = self
            .query(self.dialect.tables_query(), &[])
            .await
            .map_err(|e| CoreError::introspection(format!("failed to list tables: {}", e)))?;

        let mut schema = Schema::new();
        for name in names.into_iter().filter_map(first_text) {
            let columns = self.table_columns(&name).await.map_err(|e| {
                CoreError::introspection(format!("failed to get columns for table {}: {}", name, e))
            })?;
            let foreign_keys = self.table_foreign_keys(&name).await.map_err(|e| {
                CoreError::introspection(format!(
                    "failed to get foreign keys for table {}: {}",
                    name, e
                ))
            })?;

            schema.push(Table {
                table_name: name,
                columns,
                foreign_keys,
            });
        }

        debug!(tables = schema.len(), "Introspected schema");
        Ok(schema)
    }

    /// Whether `table` exists in the active schema.
    pub async fn table_exists(&mut self, table: &str) -> CoreResult<bool> {
        let rows = self
            .query(self.dialect.table_exists_query(), &[table])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Whether `table` has a column named `column`.
    pub async fn column_exists(&mut self, table: &str, column: &str) -> CoreResult<bool> {
        let rows = self
            .query(self.dialect.column_exists_query(), &[table, column])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Columns of `table` in ordinal order.
    pub async fn table_columns(&mut self, table: &str) -> CoreResult<Vec<Column>> {
        let rows = self.query(self.dialect.columns_query(), &[table]).await?;
        rows.into_iter().map(column_from_row).collect()
    }

    /// Foreign keys owned by `table`.
    pub async fn table_foreign_keys(&mut self, table: &str) -> CoreResult<Vec<ForeignKey>> {
        let rows = self
            .query(self.dialect.foreign_keys_query(), &[table])
            .await?;
        rows.into_iter().map(foreign_key_from_row).collect()
    }

    /// Best-effort column for pointing at a row of `table`.
    ///
    /// See [`pick_identifier`] for the precedence.
    pub async fn identifier_column(&mut self, table: &str) -> CoreResult<RowIdentifier> {
        let columns = self.table_columns(table).await?;
        let names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();
        Ok(pick_identifier(table, &names))
    }

    /// Number of rows in `table`.
    pub async fn table_row_count(&mut self, table: &str) -> CoreResult<u64> {
        let sql = self.dialect.table_row_count_query(table);
        self.count(&sql, table).await
    }

    /// Run a single-value `COUNT(*)` query; `what` names it in errors.
    pub(crate) async fn count(&mut self, sql: &str, what: &str) -> CoreResult<u64> {
        let rows = self.query(sql, &[]).await?;
        let count = rows
            .into_iter()
            .find_map(first_text)
            .ok_or_else(|| CoreError::query(format!("row count for {} returned no rows", what)))?;
        count
            .parse()
            .map_err(|_| CoreError::query(format!("invalid row count for {}: {}", what, count)))
    }
}

/// Choose the identifier column from `columns` (ordinal order).
///
/// Tries `id`, `<table>_id`, `uuid`, `guid` and `key` in that order, then the
/// first column. Nothing here guarantees uniqueness.
pub fn pick_identifier(table: &str, columns: &[&str]) -> RowIdentifier {
    for candidate in IDENTIFIER_CANDIDATES {
        let candidate = candidate.replace("{table}", table);
        if columns.contains(&candidate.as_str()) {
            return RowIdentifier::Column(candidate);
        }
    }
    match columns.first() {
        Some(first) => RowIdentifier::Column((*first).to_string()),
        None => RowIdentifier::Unavailable,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres(conn_str: &str) -> CoreResult<Box<dyn Executor>> {
    Ok(Box::new(crate::executor::PgExecutor::connect(conn_str).await?))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_conn_str: &str) -> CoreResult<Box<dyn Executor>> {
    Err(CoreError::UnsupportedDialect(
        "postgres (built without the `postgres` feature)".to_string(),
    ))
}

#[cfg(feature = "mysql")]
async fn open_mysql(url: &str) -> CoreResult<Box<dyn Executor>> {
    Ok(Box::new(crate::executor::MySqlExecutor::connect(url).await?))
}

#[cfg(not(feature = "mysql"))]
async fn open_mysql(_url: &str) -> CoreResult<Box<dyn Executor>> {
    Err(CoreError::UnsupportedDialect(
        "mysql (built without the `mysql` feature)".to_string(),
    ))
}

async fn open_executor(db_type: DatabaseType, conn_str: &str) -> CoreResult<Box<dyn Executor>> {
    match db_type {
        DatabaseType::PostgreSQL => open_postgres(conn_str).await,
        DatabaseType::MySQL => open_mysql(conn_str).await,
    }
}

fn first_text(row: TextRow) -> Option<String> {
    row.into_iter().next().flatten()
}

fn cell(row: &TextRow, index: usize) -> Option<&str> {
    row.get(index).and_then(|v| v.as_deref())
}

fn required(row: &TextRow, index: usize, what: &str) -> CoreResult<String> {
    cell(row, index)
        .map(str::to_string)
        .ok_or_else(|| CoreError::introspection(format!("catalog row is missing {}", what)))
}

fn size(row: &TextRow, index: usize) -> Option<i32> {
    cell(row, index).and_then(|v| v.trim().parse().ok())
}

fn column_from_row(row: TextRow) -> CoreResult<Column> {
    Ok(Column {
        column_name: required(&row, 0, "column name")?,
        data_type: required(&row, 1, "data type")?,
        default_value: cell(&row, 2).map(|v| serde_json::Value::String(v.to_string())),
        is_nullable: required(&row, 3, "nullability")?,
        character_max_length: size(&row, 4),
        numeric_precision: size(&row, 5),
        numeric_scale: size(&row, 6),
        datetime_precision: size(&row, 7),
    })
}

fn foreign_key_from_row(row: TextRow) -> CoreResult<ForeignKey> {
    Ok(ForeignKey {
        constraint_name: required(&row, 0, "constraint name")?,
        table_name: required(&row, 1, "table name")?,
        column_name: required(&row, 2, "column name")?,
        referenced_table: required(&row, 3, "referenced table")?,
        referenced_column: required(&row, 4, "referenced column")?,
        update_rule: cell(&row, 5).unwrap_or_default().to_string(),
        delete_rule: cell(&row, 6).unwrap_or_default().to_string(),
    })
}
