use serde_json::{json, Map, Value};
use tracing::debug;

use crate::models::{ProviderValue, Table};

use super::{normalize, normalize_all};

/// Convert a table into a `{columns, index, data}` payload.
///
/// `None` stays `None`. An empty table yields three empty arrays rather than
/// `null`. A table that cannot be decomposed is reported as unavailable.
pub fn table_to_payload(table: Option<&Table>) -> Option<Value> {
    let table = table?;
    if table.is_empty() {
        return Some(json!({"columns": [], "index": [], "data": []}));
    }

    match table.split() {
        Ok(split) => Some(json!({
            "columns": normalize_all(split.columns),
            "index": normalize_all(split.index),
            "data": split.data.iter().map(|row| normalize_all(row)).collect::<Vec<_>>(),
        })),
        Err(e) => {
            debug!("Dropping table that cannot be decomposed: {}", e);
            None
        }
    }
}

/// Convert a time-indexed series into an ordered list of `{date, value}`.
///
/// Values that are not series are normalized as-is.
pub fn series_to_payload(value: Option<&ProviderValue>) -> Option<Value> {
    let value = value?;
    let ProviderValue::Series(series) = value else {
        return Some(normalize(value));
    };

    let points = series
        .iter()
        .map(|(date, value)| {
            let mut point = Map::with_capacity(2);
            point.insert("date".to_string(), normalize(date));
            point.insert("value".to_string(), normalize(value));
            Value::Object(point)
        })
        .collect();
    Some(Value::Array(points))
}
