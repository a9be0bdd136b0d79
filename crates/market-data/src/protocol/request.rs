use std::io::Read;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// The raw request object read from stdin.
pub type RequestArgs = Map<String, Value>;

/// A request that cannot be served before any provider call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("ticker is required")]
    MissingTicker,
}

/// Read one request object from `reader`.
///
/// Never fails: unreadable, empty or malformed input, and JSON that is not an
/// object, all come back as an empty map.
pub fn read_request<R: Read>(mut reader: R) -> RequestArgs {
    let mut raw = String::new();
    if let Err(e) = reader.read_to_string(&mut raw) {
        warn!("Failed to read request from stdin: {}", e);
        return RequestArgs::new();
    }
    parse_request(&raw)
}

/// Parse a request body, degrading to an empty map.
pub fn parse_request(raw: &str) -> RequestArgs {
    let raw = raw.trim();
    if raw.is_empty() {
        return RequestArgs::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(args)) => args,
        Ok(_) => RequestArgs::new(),
        Err(e) => {
            warn!("Ignoring malformed request body: {}", e);
            RequestArgs::new()
        }
    }
}

/// A trimmed, non-empty string field.
///
/// Numbers and booleans are accepted in their textual form; null, arrays and
/// objects count as absent.
pub fn string_field(args: &RequestArgs, key: &str) -> Option<String> {
    let text = match args.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// The required `ticker` field.
pub fn ticker_field(args: &RequestArgs) -> Result<String, RequestError> {
    string_field(args, "ticker").ok_or(RequestError::MissingTicker)
}

/// An integer field; falsy or uncoercible values count as absent.
///
/// Floats are truncated and numeric strings are parsed.
pub fn integer_field(args: &RequestArgs, key: &str) -> Option<i64> {
    let value = match args.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    value.filter(|v| *v != 0)
}
