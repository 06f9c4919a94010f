//! Wire conversion and safe embedding of the initial-state payload.
//!
//! The wire value set is: boolean, finite number, string, null, ordered list
//! and ordered string-keyed mapping of wire values. Everything else is
//! rejected in [`CoercionMode::Strict`]. [`CoercionMode::Coerce`] accepts a
//! fixed allow-list on top of that: datetime, date, uuid, enum constant and
//! decimal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use crate::error::SchemaError;
use crate::schema::Schema;
use crate::value::Value;

/// How non-wire default values are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    #[default]
    Strict,
    Coerce,
}

/// Convert a default-value tree into wire data.
///
/// Fails on the first non-wire value, naming its dotted path
/// (list positions appear as indices, e.g. `items.2.createdAt`).
pub fn to_wire(value: &Value, mode: CoercionMode) -> Result<Json, SchemaError> {
    let mut path = Vec::new();
    to_wire_at(value, mode, &mut path)
}

/// Convert the declared defaults of `schema` into a wire object.
pub fn serialize_state(schema: &Schema, mode: CoercionMode) -> Result<Json, SchemaError> {
    let wire = to_wire(&schema.defaults(), mode)?;
    tracing::debug!(schema = schema.name(), ?mode, "serialized initial state");
    Ok(wire)
}

fn to_wire_at(value: &Value, mode: CoercionMode, path: &mut Vec<String>) -> Result<Json, SchemaError> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Int(i) => Ok(Json::Number((*i).into())),
        Value::Float(f) => match Number::from_f64(*f) {
            Some(n) => Ok(Json::Number(n)),
            None => Err(non_wire(path, value)),
        },
        Value::Str(s) => Ok(Json::String(s.clone())),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push(i.to_string());
                out.push(to_wire_at(item, mode, path)?);
                path.pop();
            }
            Ok(Json::Array(out))
        }
        Value::Map(entries) => {
            let mut out = Map::new();
            for (key, item) in entries {
                path.push(key.clone());
                if out.contains_key(key) {
                    return Err(SchemaError::DuplicateKey {
                        path: path.join("."),
                    });
                }
                out.insert(key.clone(), to_wire_at(item, mode, path)?);
                path.pop();
            }
            Ok(Json::Object(out))
        }
        _ if mode == CoercionMode::Strict => Err(non_wire(path, value)),
        Value::DateTime(dt) => Ok(Json::String(dt.to_rfc3339())),
        Value::Date(d) => Ok(Json::String(d.format("%Y-%m-%d").to_string())),
        Value::Uuid(u) => Ok(Json::String(u.hyphenated().to_string())),
        Value::Decimal(d) => Ok(Json::String(d.to_string())),
        Value::Enum(e) => match e.value.as_ref() {
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
                to_wire_at(&e.value, mode, path)
            }
            _ => Err(non_wire(path, value)),
        },
        Value::Bytes(_) | Value::Opaque(_) => Err(non_wire(path, value)),
    }
}

fn non_wire(path: &[String], value: &Value) -> SchemaError {
    let path = if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    };
    SchemaError::NonWireValue {
        path,
        type_name: value.type_name(),
    }
}

/// Serialize wire data to JSON text that is safe inside a non-executing
/// `<script type="application/json">` element.
pub fn encode_embedded(wire: &Json) -> String {
    escape_embedded(&wire.to_string())
}

/// Neutralize `</`, `<`, `>`, `&`, U+2028 and U+2029 in JSON text.
///
/// Every replacement is a JSON string escape, so the output still parses
/// to the same value.
pub fn escape_embedded(json: &str) -> String {
    let mut out = String::with_capacity(json.len() + 16);
    let mut chars = json.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                out.push_str("\\u003c");
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("\\/");
                }
            }
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

/// Parse embedded payload text back into wire data.
pub fn decode_embedded(text: &str) -> Result<Json, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use crate::value::EnumValue;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn test_strict_accepts_wire_tree() {
        let value = Value::map([
            ("name", Value::from("Guest")),
            ("count", Value::from(0)),
            ("tags", Value::from(vec!["a", "b"])),
        ]);
        let wire = to_wire(&value, CoercionMode::Strict).unwrap();
        assert_eq!(wire, json!({"name": "Guest", "count": 0, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_strict_reports_nested_path() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let value = Value::map([("user", Value::map([("createdAt", Value::from(created))]))]);
        let err = to_wire(&value, CoercionMode::Strict).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NonWireValue {
                path: "user.createdAt".into(),
                type_name: "datetime".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_map_key_rejected() {
        let value = Value::map([("a", Value::from(1)), ("a", Value::from(2))]);
        let err = to_wire(&value, CoercionMode::Strict).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey { path: "a".into() });

        let nested = Value::map([(
            "user",
            Value::List(vec![Value::map([("id", Value::from(1)), ("id", Value::from(1))])]),
        )]);
        let err = to_wire(&nested, CoercionMode::Coerce).unwrap_err();
        assert_eq!(err.path(), Some("user.0.id"));
    }

    #[test]
    fn test_strict_reports_list_index() {
        let value = Value::map([("items", Value::List(vec![Value::Int(1), Value::Bytes(vec![0])]))]);
        let err = to_wire(&value, CoercionMode::Strict).unwrap_err();
        assert_eq!(err.path(), Some("items.1"));
    }

    #[test]
    fn test_non_finite_float_rejected_in_both_modes() {
        let value = Value::map([("ratio", Value::Float(f64::NAN))]);
        assert!(to_wire(&value, CoercionMode::Strict).is_err());
        assert!(to_wire(&value, CoercionMode::Coerce).is_err());
    }

    #[test]
    fn test_coercion_allow_list() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let value = Value::map([
            ("at", Value::from(created)),
            ("day", Value::from(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())),
            ("id", Value::from(id)),
            ("price", Value::from(Decimal::from_str("12.50").unwrap())),
            ("color", Value::from(EnumValue::new("Color", "Red", "red"))),
        ]);
        let wire = to_wire(&value, CoercionMode::Coerce).unwrap();
        assert_eq!(
            wire,
            json!({
                "at": "2024-01-02T03:04:05+00:00",
                "day": "2024-02-29",
                "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "price": "12.50",
                "color": "red",
            })
        );
    }

    #[test]
    fn test_coercion_is_not_a_fallback() {
        let value = Value::map([("blob", Value::Bytes(vec![1, 2]))]);
        let err = to_wire(&value, CoercionMode::Coerce).unwrap_err();
        assert_eq!(err.path(), Some("blob"));

        let value = Value::map([("thing", Value::Opaque("Socket".into()))]);
        let err = to_wire(&value, CoercionMode::Coerce).unwrap_err();
        assert!(err.to_string().contains("Socket"));
    }

    #[test]
    fn test_serialize_state_uses_schema_defaults() {
        let schema = Schema::builder("PageState")
            .field("name", FieldType::Str, "Guest")
            .field("count", FieldType::Int, 0)
            .field("loading", FieldType::Bool, false)
            .build()
            .unwrap();
        let wire = serialize_state(&schema, CoercionMode::Strict).unwrap();
        assert_eq!(wire.to_string(), r#"{"name":"Guest","count":0,"loading":false}"#);
    }

    #[test]
    fn test_escape_script_breakout() {
        let wire = json!({"payload": "</script><script>alert(1)</script>"});
        let text = encode_embedded(&wire);
        assert!(!text.contains("</script>"));
        assert!(!text.contains('<'));
        assert!(text.contains("\\u003c\\/script\\u003e"));
        assert_eq!(decode_embedded(&text).unwrap(), wire);
    }

    #[test]
    fn test_escape_line_separators_and_ampersand() {
        let wire = json!({"s": "a\u{2028}b\u{2029}c & d > e"});
        let text = encode_embedded(&wire);
        assert!(!text.contains('\u{2028}'));
        assert!(!text.contains('\u{2029}'));
        assert!(!text.contains('&'));
        assert!(!text.contains('>'));
        assert!(text.contains("\\u2028"));
        assert!(text.contains("\\u2029"));
        assert_eq!(decode_embedded(&text).unwrap(), wire);
    }

    #[test]
    fn test_coercion_mode_serde_names() {
        let mode: CoercionMode = serde_json::from_str("\"coerce\"").unwrap();
        assert_eq!(mode, CoercionMode::Coerce);
        assert_eq!(CoercionMode::default(), CoercionMode::Strict);
    }
}
