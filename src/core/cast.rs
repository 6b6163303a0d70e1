//! Lenient conversions backing the typed accessors.
//!
//! Configuration files are loosely typed (`port: "8080"` is as common as
//! `port: 8080`), so the accessors accept any representation that converts
//! without loss of meaning.

use crate::core::tree::{Table, Value};
use std::collections::HashMap;
use std::time::Duration;

pub(crate) fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub(crate) fn to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

pub(crate) fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Strings use humantime syntax (`"1s"`, `"1m 30s"`); bare numbers are seconds.
pub(crate) fn to_duration(value: &Value) -> Option<Duration> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            humantime::parse_duration(s)
                .ok()
                .or_else(|| s.parse::<u64>().ok().map(Duration::from_secs))
        }
        Value::Number(n) => n
            .as_u64()
            .map(Duration::from_secs)
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(Duration::from_secs_f64)),
        _ => None,
    }
}

/// A list of scalars, or a single comma/whitespace separated string.
pub(crate) fn to_string_slice(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(to_string).collect(),
        Value::String(s) => Some(
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn to_table(value: &Value) -> Option<Table> {
    match value {
        Value::Object(table) => Some(table.clone()),
        _ => None,
    }
}

pub(crate) fn to_string_map(value: &Value) -> Option<HashMap<String, String>> {
    match value {
        Value::Object(table) => table
            .iter()
            .map(|(k, v)| to_string(v).map(|s| (k.clone(), s)))
            .collect(),
        _ => None,
    }
}
