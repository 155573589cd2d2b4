//! Driver seam.
//!
//! The engine only ever needs rows of text and affected-row counts, so each
//! driver is wrapped behind [`Executor`] and every value comes back as an
//! optional string.

use async_trait::async_trait;

use crate::error::CoreResult;

/// A result row; `None` is SQL `NULL`.
pub type TextRow = Vec<Option<String>>;

/// A single live connection.
#[async_trait]
pub trait Executor: Send {
    /// Run a query with positional text parameters.
    async fn query(&mut self, sql: &str, params: &[&str]) -> CoreResult<Vec<TextRow>>;

    /// Run a statement and return the affected-row count.
    async fn execute(&mut self, sql: &str) -> CoreResult<u64>;

    /// Round-trip to check the connection is usable.
    async fn ping(&mut self) -> CoreResult<()>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> CoreResult<()>;
}

#[cfg(feature = "postgres")]
pub use self::postgres::PgExecutor;

#[cfg(feature = "postgres")]
mod postgres {
    use async_trait::async_trait;
    use tokio_postgres::types::ToSql;
    use tokio_postgres::{Client, NoTls};
    use tracing::{debug, warn};

    use super::{Executor, TextRow};
    use crate::error::{CoreError, CoreResult};

    /// PostgreSQL connection over `tokio-postgres`.
    pub struct PgExecutor {
        client: Client,
        task: tokio::task::JoinHandle<()>,
    }

    impl PgExecutor {
        /// Connect with a key/value connection string.
        pub async fn connect(conn_str: &str) -> CoreResult<Self> {
            let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
                .await
                .map_err(|e| CoreError::connection(e.to_string()))?;

            let task = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    warn!(error = %e, "PostgreSQL connection closed with error");
                }
            });

            Ok(Self { client, task })
        }
    }

    #[async_trait]
    impl Executor for PgExecutor {
        async fn query(&mut self, sql: &str, params: &[&str]) -> CoreResult<Vec<TextRow>> {
            debug!(sql = %sql, params = ?params, "Executing query");

            let bound: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
            let rows = self.client.query(sql, &bound).await?;

            rows.iter()
                .map(|row| {
                    (0..row.len())
                        .map(|i| row.try_get::<_, Option<String>>(i).map_err(CoreError::from))
                        .collect()
                })
                .collect()
        }

        async fn execute(&mut self, sql: &str) -> CoreResult<u64> {
            debug!(sql = %sql, "Executing statement");
            Ok(self.client.execute(sql, &[]).await?)
        }

        async fn ping(&mut self) -> CoreResult<()> {
            self.client
                .simple_query("SELECT 1")
                .await
                .map_err(|e| CoreError::connection(e.to_string()))?;
            Ok(())
        }

        async fn close(self: Box<Self>) -> CoreResult<()> {
            let Self { client, task } = *self;
            drop(client);
            // The connection task ends once the client is gone.
            if let Err(e) = task.await {
                warn!(error = %e, "PostgreSQL connection task failed");
            }
            Ok(())
        }
    }
}

#[cfg(feature = "mysql")]
pub use self::mysql::MySqlExecutor;

#[cfg(feature = "mysql")]
mod mysql {
    use async_trait::async_trait;
    use mysql_async::prelude::*;
    use mysql_async::{Conn, Opts, Params, Row, Value};
    use tracing::debug;

    use super::{Executor, TextRow};
    use crate::error::{CoreError, CoreResult};

    /// MySQL connection over `mysql_async`.
    pub struct MySqlExecutor {
        conn: Conn,
    }

    impl MySqlExecutor {
        /// Connect with a `mysql://` URL.
        pub async fn connect(url: &str) -> CoreResult<Self> {
            let opts = Opts::from_url(url).map_err(|e| CoreError::config(e.to_string()))?;
            let conn = Conn::new(opts)
                .await
                .map_err(|e| CoreError::connection(e.to_string()))?;
            Ok(Self { conn })
        }
    }

    #[async_trait]
    impl Executor for MySqlExecutor {
        async fn query(&mut self, sql: &str, params: &[&str]) -> CoreResult<Vec<TextRow>> {
            debug!(sql = %sql, params = ?params, "Executing query");

            let rows: Vec<Row> = if params.is_empty() {
                self.conn.query(sql).await?
            } else {
                let values: Vec<Value> = params.iter().map(|p| Value::from(*p)).collect();
                self.conn.exec(sql, Params::Positional(values)).await?
            };

            Ok(rows
                .iter()
                .map(|row| (0..row.len()).map(|i| row.as_ref(i).and_then(value_to_text)).collect())
                .collect())
        }

        async fn execute(&mut self, sql: &str) -> CoreResult<u64> {
            debug!(sql = %sql, "Executing statement");
            self.conn.query_drop(sql).await?;
            Ok(self.conn.affected_rows())
        }

        async fn ping(&mut self) -> CoreResult<()> {
            self.conn
                .ping()
                .await
                .map_err(|e| CoreError::connection(e.to_string()))
        }

        async fn close(self: Box<Self>) -> CoreResult<()> {
            let Self { conn } = *self;
            conn.disconnect().await?;
            Ok(())
        }
    }

    fn value_to_text(value: &Value) -> Option<String> {
        match value {
            Value::NULL => None,
            Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Value::Int(i) => Some(i.to_string()),
            Value::UInt(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Double(d) => Some(d.to_string()),
            Value::Date(year, month, day, hour, minute, second, micro) => Some(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                year, month, day, hour, minute, second, micro
            )),
            Value::Time(is_neg, days, hours, minutes, seconds, micro) => Some(format!(
                "{}{}:{:02}:{:02}.{:06}",
                if *is_neg { "-" } else { "" },
                days * 24 + u32::from(*hours),
                minutes,
                seconds,
                micro
            )),
        }
    }

}
