//! Scripted in-memory executor for tests.
//!
//! Answers are keyed by the exact SQL text and parameters. Unscripted queries
//! return no rows and unscripted statements affect nothing, which reads as
//! "object missing" and "nothing to repair" respectively. Clones share state,
//! so a test can hand one clone to the engine and re-script through another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::executor::{Executor, TextRow};
use crate::model::{Column, ForeignKey, Table};

#[derive(Debug, Default)]
struct Script {
    queries: HashMap<(String, Vec<String>), CoreResult<Vec<TextRow>>>,
    statements: HashMap<String, CoreResult<u64>>,
    executed: Vec<String>,
    queried: Vec<String>,
    closed: bool,
}

/// An [`Executor`] that replays scripted answers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExecutor {
    /// Create an executor with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer `sql` with `params` by returning `rows`.
    pub fn on_query<P, R>(&self, sql: impl Into<String>, params: P, rows: R) -> &Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator<Item = TextRow>,
    {
        let key = (sql.into(), params.into_iter().map(Into::into).collect());
        self.lock()
            .queries
            .insert(key, Ok(rows.into_iter().collect()));
        self
    }

    /// Make `sql` with `params` fail with a query error.
    pub fn fail_query<P>(&self, sql: impl Into<String>, params: P, message: &str) -> &Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let key = (sql.into(), params.into_iter().map(Into::into).collect());
        self.lock()
            .queries
            .insert(key, Err(CoreError::query(message)));
        self
    }

    /// Answer statement `sql` with an affected-row count.
    pub fn on_execute(&self, sql: impl Into<String>, affected: u64) -> &Self {
        self.lock().statements.insert(sql.into(), Ok(affected));
        self
    }

    /// Make statement `sql` fail with a query error.
    pub fn fail_execute(&self, sql: impl Into<String>, message: &str) -> &Self {
        self.lock()
            .statements
            .insert(sql.into(), Err(CoreError::query(message)));
        self
    }

    /// Forget the answer to `sql` with `params`.
    pub fn forget_query<P>(&self, sql: &str, params: P) -> &Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let key = (sql.to_string(), params.into_iter().map(Into::into).collect());
        self.lock().queries.remove(&key);
        self
    }

    /// Script the catalog answers that make `table` exist with its columns
    /// and foreign keys, as `dialect` would query them.
    pub fn with_table(&self, dialect: &dyn Dialect, table: &Table) -> &Self {
        let name = table.table_name.as_str();
        self.on_query(dialect.table_exists_query(), [name], [text_row([name])]);
        self.on_query(
            dialect.columns_query(),
            [name],
            table.columns.iter().map(column_row),
        );
        self.on_query(
            dialect.foreign_keys_query(),
            [name],
            table.foreign_keys.iter().map(foreign_key_row),
        );
        for column in &table.columns {
            self.on_query(
                dialect.column_exists_query(),
                [name, column.column_name.as_str()],
                [text_row([column.column_name.as_str()])],
            );
        }
        self
    }

    /// Script the table listing.
    pub fn with_table_list<'a>(
        &self,
        dialect: &dyn Dialect,
        names: impl IntoIterator<Item = &'a str>,
    ) -> &Self {
        let params: [&str; 0] = [];
        self.on_query(
            dialect.tables_query(),
            params,
            names.into_iter().map(|n| text_row([n])),
        );
        self
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    /// SQL passed to `query`, in order.
    pub fn queried(&self) -> Vec<String> {
        self.lock().queried.clone()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn query(&mut self, sql: &str, params: &[&str]) -> CoreResult<Vec<TextRow>> {
        let mut script = self.lock();
        script.queried.push(sql.to_string());
        let key = (
            sql.to_string(),
            params.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        );
        match script.queries.get(&key) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(e)) => Err(CoreError::query(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn execute(&mut self, sql: &str) -> CoreResult<u64> {
        let mut script = self.lock();
        script.executed.push(sql.to_string());
        match script.statements.get(sql) {
            Some(Ok(affected)) => Ok(*affected),
            Some(Err(e)) => Err(CoreError::query(e.to_string())),
            None => Ok(0),
        }
    }

    async fn ping(&mut self) -> CoreResult<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> CoreResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// A row of non-null text values.
pub fn text_row<'a>(values: impl IntoIterator<Item = &'a str>) -> TextRow {
    values.into_iter().map(|v| Some(v.to_string())).collect()
}

fn column_row(column: &Column) -> TextRow {
    let default = match &column.default_value {
        None | Some(serde_json::Value::Null) => None,
        Some(_) => Some(column.default_text()),
    };
    vec![
        Some(column.column_name.clone()),
        Some(column.data_type.clone()),
        default,
        Some(column.is_nullable.clone()),
        column.character_max_length.map(|v| v.to_string()),
        column.numeric_precision.map(|v| v.to_string()),
        column.numeric_scale.map(|v| v.to_string()),
        column.datetime_precision.map(|v| v.to_string()),
    ]
}

fn foreign_key_row(fk: &ForeignKey) -> TextRow {
    text_row([
        fk.constraint_name.as_str(),
        fk.table_name.as_str(),
        fk.column_name.as_str(),
        fk.referenced_table.as_str(),
        fk.referenced_column.as_str(),
        fk.update_rule.as_str(),
        fk.delete_rule.as_str(),
    ])
}
