//! Database connection seam.

use crate::row::Row;
use crate::value::SqlValue;
use crate::DaoResult;
use std::ops::ControlFlow;

/// Per-row callback. Returning `Break` stops reading further rows.
pub type RowHandler<'a> = &'a mut dyn FnMut(Row) -> DaoResult<ControlFlow<()>>;

/// A relational client the [`Dao`](crate::Dao) runs statements on.
///
/// Methods take `&self` so a row handler may run further statements on the
/// same connection while a query is still being read.
pub trait Connection: Send {
    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> DaoResult<u64>;

    /// Run a query, handing each row to `on_row` as it is read.
    fn query(&self, sql: &str, params: &[SqlValue], on_row: RowHandler<'_>) -> DaoResult<()>;

    /// Run several `;`-separated statements without parameters.
    fn batch(&self, sql: &str) -> DaoResult<()>;

    /// Row id generated by the last successful insert.
    fn last_insert_id(&self) -> i64;

    /// Short backend name, for logging.
    fn backend(&self) -> &'static str;
}
