//! Flat bulk-assignment of data maps onto model structs

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// `user_name` → `userName`.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// A flat value object that can be filled from loosely typed maps.
///
/// Only keys matching a serialized field name (directly, or after
/// snake→camel translation) are assigned; everything else is ignored.
/// Fields marked `#[serde(skip)]` are never touched.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use uno_core::Model;
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct User {
///     id: i64,
///     #[serde(rename = "displayName")]
///     display_name: String,
/// }
///
/// impl Model for User {}
///
/// let mut user = User::default();
/// user.load(&[json!({"id": 7, "display_name": "Ann", "password": "x"})]).unwrap();
/// assert_eq!(user.id, 7);
/// assert_eq!(user.display_name, "Ann");
/// ```
pub trait Model: Serialize + DeserializeOwned + Sized {
    fn load(&mut self, data: &[Value]) -> Result<()> {
        let mut fields = self.to_map()?;
        let merged = uno_handlebars::merge_data(data)
            .map_err(|e| Error::Deserialization(e.to_string()))?;

        for (key, value) in merged {
            if fields.contains_key(&key) {
                fields.insert(key, value);
                continue;
            }
            let camel = snake_to_camel(&key);
            if fields.contains_key(&camel) {
                fields.insert(camel, value);
            }
        }

        *self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        Ok(())
    }

    fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Serialization(format!(
                "model serialized to {other}, expected an object"
            ))),
        }
    }
}

/// The `load` capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Loader;

impl Loader {
    /// Build a default `T` and load `data` into it.
    pub fn load<T: Model + Default>(&self, data: &[Value]) -> Result<T> {
        let mut model = T::default();
        model.load(data)?;
        Ok(model)
    }

    /// Load `data` into an existing model.
    pub fn fill<T: Model>(&self, model: &mut T, data: &[Value]) -> Result<()> {
        model.load(data)
    }
}
