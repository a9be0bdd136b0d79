//! Conversion of provider values into strict JSON.
//!
//! [`normalize`] is total: every [`ProviderValue`] maps to a
//! `serde_json::Value` that contains no NaN/Infinity, no date objects and no
//! provider wrappers. Anything the normalizer cannot represent is rendered
//! through its display form.

mod adapters;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde_json::{Map, Number, Value};

use crate::models::ProviderValue;

pub use adapters::{series_to_payload, table_to_payload};

/// Convert a provider value into a JSON-safe value.
pub fn normalize(value: &ProviderValue) -> Value {
    match value {
        ProviderValue::Null => Value::Null,
        ProviderValue::Bool(b) => Value::Bool(*b),
        ProviderValue::Int(i) => Value::from(*i),
        ProviderValue::Float(f) => finite_number(*f),
        // JSON has no complex numbers and the display form is never useful
        ProviderValue::Complex { .. } => Value::Null,
        ProviderValue::Str(s) => Value::String(s.clone()),
        ProviderValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        ProviderValue::DateTime(dt) => Value::String(iso_naive(dt)),
        ProviderValue::ZonedDateTime(dt) => Value::String(iso_zoned(dt)),
        ProviderValue::Scalar(wrapped) => match wrapped.extract() {
            Some(inner) => normalize(inner),
            None => Value::String(wrapped.repr().to_string()),
        },
        ProviderValue::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                object.insert(key.to_string(), normalize(value));
            }
            Value::Object(object)
        }
        ProviderValue::Sequence(items) => normalize_all(items),
        ProviderValue::Array(wrapped) => match wrapped.extract() {
            Some(items) => normalize_all(items),
            None => Value::String(wrapped.repr().to_string()),
        },
        ProviderValue::Table(table) => table_to_payload(Some(table)).unwrap_or(Value::Null),
        ProviderValue::Series(_) => series_to_payload(Some(value)).unwrap_or(Value::Null),
        ProviderValue::Unknown(repr) => Value::String(repr.clone()),
    }
}

/// Normalize every element of a slice into a JSON array.
pub fn normalize_all(items: &[ProviderValue]) -> Value {
    Value::Array(items.iter().map(normalize).collect())
}

/// Metadata maps are reported as `{}` when the provider hands back nothing.
pub fn normalize_metadata(value: &ProviderValue) -> Value {
    if value.is_blank() {
        Value::Object(Map::new())
    } else {
        normalize(value)
    }
}

fn finite_number(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn iso_naive(dt: &NaiveDateTime) -> String {
    let mut out = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    let micros = dt.nanosecond() / 1_000;
    if micros != 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

fn iso_zoned(dt: &DateTime<FixedOffset>) -> String {
    let mut out = iso_naive(&dt.naive_local());
    out.push_str(&dt.format("%:z").to_string());
    out
}
