//! TOML output for loaded documents.
//!
//! Mapping from the JSON projection to TOML:
//!   - bool            -> TOML boolean
//!   - integer         -> TOML integer (must fit in i64)
//!   - float           -> TOML float
//!   - string          -> TOML string
//!   - array           -> TOML array (objects inside become inline tables)
//!   - object          -> TOML table, keys in document order
//!
//! TOML has no null, and its top level must be a table; both are errors.

use serde_json::{Number, Value};
use toml_edit::{Array, DocumentMut, Formatted, InlineTable, Item, Table};

/// Encode a projected document as TOML text.
pub fn encode(value: &Value) -> Result<String, String> {
    let Value::Object(map) = value else {
        return Err(format!(
            "TOML requires the top-level value to be a mapping, not {}",
            type_name(value)
        ));
    };
    let mut doc = DocumentMut::new();
    for (key, item) in map {
        doc.insert(key, to_item(item, key)?);
    }
    Ok(doc.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn to_item(value: &Value, path: &str) -> Result<Item, String> {
    match value {
        Value::Object(map) => {
            let mut table = Table::new();
            for (key, item) in map {
                table.insert(key, to_item(item, &format!("{}.{}", path, key))?);
            }
            Ok(Item::Table(table))
        }
        other => Ok(Item::Value(to_value(other, path)?)),
    }
}

fn to_value(value: &Value, path: &str) -> Result<toml_edit::Value, String> {
    match value {
        Value::Null => Err(format!("TOML has no null type (at {})", path)),
        Value::Bool(b) => Ok(toml_edit::Value::Boolean(Formatted::new(*b))),
        Value::Number(n) => number(n, path),
        Value::String(s) => Ok(toml_edit::Value::String(Formatted::new(s.clone()))),
        Value::Array(items) => {
            let mut array = Array::new();
            for (i, item) in items.iter().enumerate() {
                array.push(to_value(item, &format!("{}[{}]", path, i))?);
            }
            Ok(toml_edit::Value::Array(array))
        }
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, item) in map {
                table.insert(key.as_str(), to_value(item, &format!("{}.{}", path, key))?);
            }
            Ok(toml_edit::Value::InlineTable(table))
        }
    }
}

fn number(n: &Number, path: &str) -> Result<toml_edit::Value, String> {
    if let Some(i) = n.as_i64() {
        Ok(toml_edit::Value::Integer(Formatted::new(i)))
    } else if n.is_u64() {
        Err(format!("TOML integers must fit in i64; {} is too large (at {})", n, path))
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        Ok(toml_edit::Value::Float(Formatted::new(f)))
    }
}
