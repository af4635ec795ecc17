//! Cypher lexical helpers: identifier quoting and literal rendering.

use std::fmt::Write;

use crate::model::Properties;
use crate::types::Value;

/// Quotes `name` with backticks unless it is a plain identifier.
pub fn identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if plain {
        name.to_owned()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Renders a value as a Cypher literal.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) if v.is_nan() => "0.0/0.0".to_owned(),
        Value::Float(v) if v.is_infinite() && *v > 0.0 => "1.0/0.0".to_owned(),
        Value::Float(v) if v.is_infinite() => "-1.0/0.0".to_owned(),
        Value::Float(v) => format!("{v:?}"),
        Value::String(v) => string_literal(v),
    }
}

fn string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Renders the non-null properties as an inline map, or `None` when there
/// are none.
pub fn property_map(properties: &Properties) -> Option<String> {
    let entries: Vec<String> = properties
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| format!("{}: {}", identifier(key), literal(value)))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", entries.join(", ")))
    }
}
