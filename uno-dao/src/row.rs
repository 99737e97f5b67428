//! Result rows.

use crate::value::SqlValue;
use crate::{DaoError, DaoResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// One result row: ordered column names and values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create a row. Rows of one result share the `columns` allocation.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Value of the column `name`.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Value of the column `name`, or [`DaoError::MissingColumn`].
    pub fn require(&self, name: &str) -> DaoResult<&SqlValue> {
        self.get(name)
            .ok_or_else(|| DaoError::MissingColumn(name.to_string()))
    }

    /// Value at `index`.
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    /// The row as a JSON object keyed by column name. A repeated column
    /// name keeps its last value.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .cloned()
            .zip(self.values.iter().map(SqlValue::to_json))
            .collect();
        Value::Object(map)
    }

    /// Deserialize the row into `T` through its JSON form.
    pub fn deserialize<T: DeserializeOwned>(&self) -> DaoResult<T> {
        serde_json::from_value(self.to_json()).map_err(|e| DaoError::Decode(e.to_string()))
    }
}
