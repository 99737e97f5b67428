//! SQL values, type hints and bound parameters.

use serde_json::Value;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Whether this is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer value, converting reals and numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(n) => Some(*n),
            SqlValue::Real(r) => Some(*r as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float value, converting integers and numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(n) => Some(*n as f64),
            SqlValue::Real(r) => Some(*r),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrowed text, for `Text` values only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrowed bytes, for `Blob` values only.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Convert from JSON. Arrays and objects become their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }
    }

    /// Convert to JSON. Blobs become arrays of byte values.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(n) => Value::from(*n),
            SqlValue::Real(r) => Value::from(*r),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Blob(b) => Value::from(b.clone()),
        }
    }

    /// Text form, as a string-typed column would report it.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(n) => Some(n.to_string()),
            SqlValue::Real(r) => Some(r.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Apply the coercion `hint` asks for at bind time.
    pub fn coerce(self, hint: ParamType) -> SqlValue {
        match (hint, self) {
            (ParamType::Null, _) | (_, SqlValue::Null) => SqlValue::Null,
            (ParamType::Str, SqlValue::Integer(n)) => SqlValue::Text(n.to_string()),
            (ParamType::Str, SqlValue::Real(r)) => SqlValue::Text(r.to_string()),
            (ParamType::Int, SqlValue::Real(r)) => SqlValue::Integer(r as i64),
            (ParamType::Int, SqlValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(n) => SqlValue::Integer(n),
                Err(_) => SqlValue::Text(s),
            },
            (ParamType::Bool, value) => SqlValue::Integer(i64::from(truthy(&value))),
            (ParamType::Lob, SqlValue::Text(s)) => SqlValue::Blob(s.into_bytes()),
            (_, value) => value,
        }
    }
}

fn truthy(value: &SqlValue) -> bool {
    match value {
        SqlValue::Null => false,
        SqlValue::Integer(n) => *n != 0,
        SqlValue::Real(r) => *r != 0.0,
        SqlValue::Text(s) => !s.is_empty() && s != "0",
        SqlValue::Blob(b) => !b.is_empty(),
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(value: $t) -> Self {
                    SqlValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Real(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// How a bound value is coerced before it reaches the database.
///
/// `Str` is the default: numbers are sent as their text form and booleans
/// as `"1"`/`"0"`. Use `Int` where SQL requires an integer, such as
/// `LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    /// Always `NULL`.
    Null,
    /// Integer; numeric text is parsed.
    Int,
    /// Text.
    #[default]
    Str,
    /// `0`/`1` by truthiness.
    Bool,
    /// Binary; text is sent as its bytes.
    Lob,
}

/// A recorded positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Value as given.
    pub value: SqlValue,
    /// Coercion applied when the statement runs.
    pub hint: ParamType,
}

impl Param {
    /// Value after applying the hint.
    pub fn bound(&self) -> SqlValue {
        self.value.clone().coerce(self.hint)
    }
}

/// One value, or a list bound as comma-separated placeholders.
///
/// A `Vec<u8>` is a list of integers here; wrap it in [`SqlValue::Blob`] to
/// bind a single blob.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// A single value.
    One(SqlValue),
    /// A list of values, one placeholder each.
    Many(Vec<SqlValue>),
}

impl SqlParam {
    /// The values in binding order.
    pub fn into_values(self) -> Vec<SqlValue> {
        match self {
            SqlParam::One(value) => vec![value],
            SqlParam::Many(values) => values,
        }
    }
}

impl From<SqlValue> for SqlParam {
    fn from(value: SqlValue) -> Self {
        SqlParam::One(value)
    }
}

macro_rules! impl_param_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlParam {
                fn from(value: $t) -> Self {
                    SqlParam::One(value.into())
                }
            }
        )*
    };
}

impl_param_scalar!(i8, i16, i32, i64, u8, u16, u32, bool, f32, f64, String);

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::One(value.into())
    }
}

impl From<&String> for SqlParam {
    fn from(value: &String) -> Self {
        SqlParam::One(value.into())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        SqlParam::One(value.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlParam {
    fn from(values: Vec<T>) -> Self {
        SqlParam::Many(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue> + Clone> From<&[T]> for SqlParam {
    fn from(values: &[T]) -> Self {
        SqlParam::Many(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for SqlParam {
    fn from(values: [T; N]) -> Self {
        SqlParam::Many(values.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => SqlParam::Many(items.iter().map(SqlValue::from_json).collect()),
            other => SqlParam::One(SqlValue::from_json(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_hint_is_text() {
        assert_eq!(SqlValue::from(42).coerce(ParamType::default()), SqlValue::Text("42".into()));
        assert_eq!(SqlValue::from(true).coerce(ParamType::Str), SqlValue::Text("1".into()));
        assert_eq!(SqlValue::Null.coerce(ParamType::Str), SqlValue::Null);
    }

    #[test]
    fn test_int_and_bool_hints() {
        assert_eq!(SqlValue::from("12").coerce(ParamType::Int), SqlValue::Integer(12));
        assert_eq!(SqlValue::from("x").coerce(ParamType::Int), SqlValue::Text("x".into()));
        assert_eq!(SqlValue::from(2.9).coerce(ParamType::Int), SqlValue::Integer(2));
        assert_eq!(SqlValue::from("0").coerce(ParamType::Bool), SqlValue::Integer(0));
        assert_eq!(SqlValue::from("no").coerce(ParamType::Bool), SqlValue::Integer(1));
        assert_eq!(SqlValue::from("ab").coerce(ParamType::Lob), SqlValue::Blob(b"ab".to_vec()));
        assert_eq!(SqlValue::from(5).coerce(ParamType::Null), SqlValue::Null);
    }

    #[test]
    fn test_params_from_lists_and_options() {
        assert_eq!(SqlParam::from(vec![1, 2]).into_values().len(), 2);
        assert_eq!(SqlParam::from([1, 2, 3]).into_values().len(), 3);
        assert_eq!(SqlParam::from(None::<i32>), SqlParam::One(SqlValue::Null));
        assert_eq!(
            SqlParam::from(&json!(["a", 1])),
            SqlParam::Many(vec![SqlValue::Text("a".into()), SqlValue::Integer(1)])
        );
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(SqlValue::from_json(&json!({"a": 1})), SqlValue::Text(r#"{"a":1}"#.into()));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Real(1.5));
        assert_eq!(SqlValue::Integer(3).to_json(), json!(3));
        assert_eq!(SqlValue::Real(2.5).to_text().as_deref(), Some("2.5"));
    }
}
