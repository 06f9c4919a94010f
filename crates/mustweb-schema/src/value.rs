use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A server-side default value, before any wire conversion.
///
/// The first seven variants form the wire-compatible set. The rest are kept
/// as-is so the state serializer can either reject them (strict mode) or
/// convert them through its fixed allow-list (coercion mode).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Ordered string-keyed mapping; key order is construction order.
    Map(Vec<(String, Value)>),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Uuid(Uuid),
    Decimal(Decimal),
    Enum(EnumValue),
    Bytes(Vec<u8>),
    /// Any other host type, identified only by name.
    Opaque(String),
}

/// A constant of an enumerated type, carrying its underlying primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub type_name: String,
    pub variant: String,
    pub value: Box<Value>,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
            value: Box::new(value.into()),
        }
    }
}

impl Value {
    /// Build an ordered mapping from `(key, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short lowercase name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "boolean".into(),
            Value::Int(_) => "integer".into(),
            Value::Float(f) if !f.is_finite() => "non-finite float".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "string".into(),
            Value::List(_) => "list".into(),
            Value::Map(_) => "mapping".into(),
            Value::DateTime(_) => "datetime".into(),
            Value::Date(_) => "date".into(),
            Value::Uuid(_) => "uuid".into(),
            Value::Decimal(_) => "decimal".into(),
            Value::Enum(e) => format!("enum {}", e.type_name),
            Value::Bytes(_) => "bytes".into(),
            Value::Opaque(name) => name.clone(),
        }
    }

    /// Look up a key in a mapping value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v.fixed_offset())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = Value::from(json!({"b": 1, "a": [true, null]}));
        let Value::Map(entries) = value else {
            panic!("expected a mapping");
        };
        assert_eq!(entries[0].0, "b");
        assert_eq!(entries[1].0, "a");
        assert_eq!(entries[1].1, Value::List(vec![Value::Bool(true), Value::Null]));
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Float(f64::INFINITY).type_name(), "non-finite float");
        assert_eq!(Value::Bytes(vec![1]).type_name(), "bytes");
        assert_eq!(
            Value::Enum(EnumValue::new("Color", "Red", "red")).type_name(),
            "enum Color"
        );
    }

    #[test]
    fn test_map_get() {
        let value = Value::map([("name", Value::from("Ada"))]);
        assert_eq!(value.get("name"), Some(&Value::Str("Ada".into())));
        assert_eq!(value.get("missing"), None);
    }
}
