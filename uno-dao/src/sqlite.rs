//! SQLite backend.

use crate::connection::{Connection, RowHandler};
use crate::row::Row;
use crate::value::SqlValue;
use crate::{DaoError, DaoResult};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, ToSql};
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uno_log::{debug, info};

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            SqlValue::Null => ValueRef::Null,
            SqlValue::Integer(n) => ValueRef::Integer(*n),
            SqlValue::Real(r) => ValueRef::Real(*r),
            SqlValue::Text(s) => ValueRef::Text(s.as_bytes()),
            SqlValue::Blob(b) => ValueRef::Blob(b),
        }))
    }
}

fn from_value_ref(value: ValueRef<'_>) -> DaoResult<SqlValue> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Integer(n),
        ValueRef::Real(r) => SqlValue::Real(r),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| DaoError::Decode(format!("SQLite text decode failed: {e}")))?;
            SqlValue::Text(text.to_string())
        }
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

/// A [`Connection`] backed by `rusqlite`.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DaoResult<Self> {
        let path = path.as_ref();
        info!(target: "uno::dao", "Opening SQLite database {}", path.display());
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| DaoError::Connection(format!("{}: {}", path.display(), e)))?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> DaoResult<Self> {
        debug!(target: "uno::dao", "Opening in-memory SQLite database");
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| DaoError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Wait up to `timeout` for a locked database instead of failing.
    pub fn busy_timeout(self, timeout: Duration) -> DaoResult<Self> {
        self.conn.busy_timeout(timeout)?;
        Ok(self)
    }

    /// The underlying `rusqlite` connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> DaoResult<u64> {
        let mut stmt = self.conn.prepare(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query(&self, sql: &str, params: &[SqlValue], on_row: RowHandler<'_>) -> DaoResult<()> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(from_value_ref(row.get_ref(idx)?)?);
            }
            if let ControlFlow::Break(()) = on_row(Row::new(columns.clone(), values))? {
                break;
            }
        }
        Ok(())
    }

    fn batch(&self, sql: &str) -> DaoResult<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .finish()
    }
}
