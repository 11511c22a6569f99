//! Lenient JSON field helpers
//!
//! The `deserialize_with` helpers accept whatever the REST services send for
//! a field (numbers as strings, `null`, booleans) and fall back to the type's
//! default instead of failing the whole record. Records declare
//! `#[serde(default)]` so missing keys take the same path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::{Map, Value};

/// Interpret a JSON value as an integer
///
/// Fractional numbers are truncated; numeric strings are parsed after
/// trimming. Everything else yields `None`.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value).unwrap_or_default())
}

pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_int(&value))
}

pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_decimal(&value).unwrap_or_default())
}

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_text(&value))
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_flag(&value))
}

/// A list of records; a non-array value is an empty list and each item that
/// fails to parse becomes `T::default()`
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(records(&value))
}

/// A list of raw JSON objects, anything else yields an empty list
pub fn raw_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// Write a boolean the way the services spell it: `"true"` / `"false"`
pub fn flag_text<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Write an always-empty array regardless of the field's content
pub fn empty_list<V, S: Serializer>(_value: &V, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    serializer.serialize_seq(Some(0))?.end()
}

/// Parse one record, falling back to `T::default()` on any mismatch
pub fn record<T: DeserializeOwned + Default>(value: &Value) -> T {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
        _ => T::default(),
    }
}

/// Parse every item of an array with [`record`]
pub fn records<T: DeserializeOwned + Default>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(items) => items.iter().map(record).collect(),
        _ => Vec::new(),
    }
}

static NULL: Value = Value::Null;

/// Follow a path of object keys, yielding `Null` when any step is missing
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .try_fold(value, |current, key| current.get(*key))
        .unwrap_or(&NULL)
}

/// Rebuild field-named records from the `{"Fields": [...], "Rows": [[...]]}`
/// tabular shape
///
/// Each row is paired positionally with the field names; surplus cells or
/// names on either side are dropped.
pub fn zip_rows(table: &Value) -> Vec<Map<String, Value>> {
    let fields: Vec<String> = match table.get("Fields") {
        Some(Value::Array(names)) => names.iter().map(as_text).collect(),
        _ => return Vec::new(),
    };

    let Some(Value::Array(rows)) = table.get("Rows") else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| row.as_array())
        .map(|cells| {
            fields
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect::<Map<String, Value>>()
        })
        .collect()
}
