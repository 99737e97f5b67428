//! One-statement builder and executor.

use crate::connection::RowHandler;
use crate::row::Row;
use crate::value::{Param, ParamType, SqlParam, SqlValue};
use crate::{Dao, DaoError, DaoResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::ControlFlow;
use uno_log::{debug, trace};

/// Builds and runs exactly one SQL statement at a time.
///
/// Parameters are collected with [`bind`](Self::bind), which returns the
/// placeholder text to splice into the SQL. Every executing method takes
/// the pending SQL and parameters, so the builder is empty afterwards,
/// whether the statement succeeded or not.
///
/// Cloning a statement yields an empty builder on the same [`Dao`].
pub struct Statement {
    dao: Dao,
    sql: Option<String>,
    params: Vec<Param>,
}

impl Statement {
    pub(crate) fn new(dao: Dao) -> Self {
        Self {
            dao,
            sql: None,
            params: Vec::new(),
        }
    }

    pub(crate) fn with_sql(dao: Dao, sql: String) -> Self {
        Self {
            dao,
            sql: Some(sql),
            params: Vec::new(),
        }
    }

    fn ensure_idle(&self) -> DaoResult<()> {
        match &self.sql {
            Some(pending) => Err(DaoError::StatementPending(pending.clone())),
            None => Ok(()),
        }
    }

    /// Set the SQL text. Fails with [`DaoError::StatementPending`] if SQL
    /// is already set.
    pub fn sql(&mut self, text: &str) -> DaoResult<&mut Self> {
        self.ensure_idle()?;
        self.sql = Some(text.to_string());
        Ok(self)
    }

    /// Set the SQL text from the file `name` rendered with `data`.
    /// `.sql` is appended to `name`, so pass `users/find`, not
    /// `users/find.sql`.
    pub fn file(&mut self, name: &str, data: &[Value]) -> DaoResult<&mut Self> {
        self.ensure_idle()?;
        self.sql = Some(self.dao.render(name, data)?);
        Ok(self)
    }

    /// Record `value` (or every element of a list) as a text parameter and
    /// return its placeholders: `?`, or `?,?,?` for a list of three.
    pub fn bind(&mut self, value: impl Into<SqlParam>) -> String {
        self.bind_as(value, ParamType::default())
    }

    /// [`bind`](Self::bind) with an explicit type hint.
    pub fn bind_as(&mut self, value: impl Into<SqlParam>, hint: ParamType) -> String {
        let values = value.into().into_values();
        let marks = vec!["?"; values.len()].join(",");
        self.params
            .extend(values.into_iter().map(|value| Param { value, hint }));
        marks
    }

    /// Bind `value` through the registered binder `name`.
    pub fn bind_with(&mut self, name: &str, value: &Value) -> DaoResult<String> {
        let binder = self.dao.binders.get(name)?;
        let bound = binder(value)?;
        Ok(self.bind_as(bound.value, bound.hint))
    }

    /// Quote an identifier with the Dao's escaper.
    pub fn escape(&self, identifier: &str) -> DaoResult<String> {
        self.dao.escape(identifier)
    }

    /// Drop the pending SQL and parameters.
    pub fn reset(&mut self) -> &mut Self {
        self.sql = None;
        self.params.clear();
        self
    }

    /// Whether SQL is set and waiting to run.
    pub fn is_pending(&self) -> bool {
        self.sql.is_some()
    }

    /// The pending SQL.
    pub fn sql_text(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Parameters recorded so far, in placeholder order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The Dao this statement runs on.
    pub fn dao(&self) -> &Dao {
        &self.dao
    }

    fn take(&mut self) -> DaoResult<(String, Vec<SqlValue>)> {
        let sql = self.sql.take();
        let params = std::mem::take(&mut self.params);
        let sql = sql.ok_or(DaoError::MissingStatement)?;

        debug!(target: "uno::dao", "SQL: {}", sql);
        let values: Vec<SqlValue> = params.iter().map(Param::bound).collect();
        trace!(target: "uno::dao", "params: {:?}", values);
        Ok((sql, values))
    }

    fn query(&mut self, on_row: RowHandler<'_>) -> DaoResult<()> {
        let (sql, params) = self.take()?;
        let connection = self.dao.connection.lock();
        connection.query(&sql, &params, on_row)
    }

    /// Run a statement that returns no rows. Returns the affected row count.
    pub fn execute(&mut self) -> DaoResult<u64> {
        let (sql, params) = self.take()?;
        let connection = self.dao.connection.lock();
        connection.execute(&sql, &params)
    }

    /// Run the query and hand each row to `handler` without collecting them.
    pub fn stream<F>(&mut self, mut handler: F) -> DaoResult<()>
    where
        F: FnMut(Row) -> DaoResult<()>,
    {
        self.query(&mut |row| {
            handler(row)?;
            Ok(ControlFlow::Continue(()))
        })
    }

    /// Every row, in result order.
    pub fn list(&mut self) -> DaoResult<Vec<Row>> {
        self.list_map(Ok)
    }

    /// Every row, transformed by `mapper`.
    pub fn list_map<T, F>(&mut self, mut mapper: F) -> DaoResult<Vec<T>>
    where
        F: FnMut(Row) -> DaoResult<T>,
    {
        let mut items = Vec::new();
        self.stream(|row| {
            items.push(mapper(row)?);
            Ok(())
        })?;
        Ok(items)
    }

    /// Every row, deserialized into `T`.
    pub fn list_as<T: DeserializeOwned>(&mut self) -> DaoResult<Vec<T>> {
        self.list_map(|row| row.deserialize())
    }

    /// The only row, or `None`. More than one row is
    /// [`DaoError::TooManyRows`].
    pub fn one(&mut self) -> DaoResult<Option<Row>> {
        let rows = self.list()?;
        match rows.len() {
            0 | 1 => Ok(rows.into_iter().next()),
            count => Err(DaoError::TooManyRows { count }),
        }
    }

    /// [`one`](Self::one), deserialized into `T`.
    pub fn one_as<T: DeserializeOwned>(&mut self) -> DaoResult<Option<T>> {
        self.one()?.map(|row| row.deserialize()).transpose()
    }

    /// Rows keyed by the text of their `key` column. A repeated key keeps
    /// the last row.
    pub fn map(&mut self, key: &str) -> DaoResult<HashMap<String, Row>> {
        let mut map = HashMap::new();
        self.stream(|row| {
            let k = row.require(key)?.to_text().unwrap_or_default();
            map.insert(k, row);
            Ok(())
        })?;
        Ok(map)
    }

    /// The `value_key` column keyed by the text of the `key` column.
    pub fn map_field(&mut self, key: &str, value_key: &str) -> DaoResult<HashMap<String, SqlValue>> {
        let mut map = HashMap::new();
        self.stream(|row| {
            let k = row.require(key)?.to_text().unwrap_or_default();
            map.insert(k, row.require(value_key)?.clone());
            Ok(())
        })?;
        Ok(map)
    }

    /// Column `index` of the first row, or `None` when there are no rows.
    /// Rows after the first are not read.
    pub fn column(&mut self, index: usize) -> DaoResult<Option<SqlValue>> {
        let mut first = None;
        self.query(&mut |row| {
            first = Some(row.into_values());
            Ok(ControlFlow::Break(()))
        })?;

        match first {
            None => Ok(None),
            Some(values) => values
                .into_iter()
                .nth(index)
                .map(Some)
                .ok_or_else(|| DaoError::MissingColumn(format!("#{index}"))),
        }
    }
}

impl Clone for Statement {
    fn clone(&self) -> Self {
        self.dao.statement()
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}
