//! Named value binders.

use crate::value::{ParamType, SqlParam};
use crate::{DaoError, DaoResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What a binder produces: the value(s) to bind and their hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Value or list of values.
    pub value: SqlParam,
    /// Coercion hint.
    pub hint: ParamType,
}

impl Bound {
    /// Bind `value` with the default hint.
    pub fn new(value: impl Into<SqlParam>) -> Self {
        Self {
            value: value.into(),
            hint: ParamType::default(),
        }
    }

    /// Bind `value` with `hint`.
    pub fn with_hint(value: impl Into<SqlParam>, hint: ParamType) -> Self {
        Self {
            value: value.into(),
            hint,
        }
    }
}

/// Transforms an arbitrary value into something bindable.
pub type Binder = Arc<dyn Fn(&Value) -> DaoResult<Bound> + Send + Sync>;

/// Name of the binder registered by default.
pub const JSON_BINDER: &str = "json";

/// Binds a value as its JSON text.
pub fn json_binder(value: &Value) -> DaoResult<Bound> {
    let text = serde_json::to_string(value).map_err(|e| DaoError::Binder {
        name: JSON_BINDER.to_string(),
        message: e.to_string(),
    })?;
    Ok(Bound::new(text))
}

/// Case-insensitive binder registry shared by a `Dao` and its statements.
#[derive(Clone)]
pub struct BinderRegistry {
    binders: Arc<RwLock<HashMap<String, Binder>>>,
}

impl BinderRegistry {
    /// Create a registry holding the `json` binder.
    pub fn new() -> Self {
        let registry = Self {
            binders: Arc::default(),
        };
        registry.register(JSON_BINDER, json_binder);
        registry
    }

    /// Register (or replace) the binder `name`.
    pub fn register<F>(&self, name: &str, binder: F)
    where
        F: Fn(&Value) -> DaoResult<Bound> + Send + Sync + 'static,
    {
        self.binders.write().insert(name.to_lowercase(), Arc::new(binder));
    }

    /// Look up `name`.
    pub fn get(&self, name: &str) -> DaoResult<Binder> {
        self.binders
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| DaoError::UnknownBinder(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.binders.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BinderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("binders", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn test_json_binder() {
        let bound = json_binder(&json!({"tags": ["a/b"]})).unwrap();
        assert_eq!(bound.value, SqlParam::One(SqlValue::Text(r#"{"tags":["a/b"]}"#.into())));
        assert_eq!(bound.hint, ParamType::Str);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = BinderRegistry::new();
        registry.register("Upper", |v| {
            Ok(Bound::new(v.as_str().unwrap_or_default().to_uppercase()))
        });
        assert!(registry.get("UPPER").is_ok());
        assert!(registry.get("Json").is_ok());
        assert!(matches!(registry.get("csv"), Err(DaoError::UnknownBinder(ref n)) if n == "csv"));
        assert_eq!(registry.names(), vec!["json", "upper"]);
    }
}
