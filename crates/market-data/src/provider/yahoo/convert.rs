//! Conversion of Yahoo JSON payloads into provider values.
//!
//! Yahoo boxes most numbers as `{"raw": 123.4, "fmt": "123.40"}`. Those
//! become [`Wrapped`] values so the normalizer can unwrap them, keeping the
//! formatted string as the fallback.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::models::{ProviderValue, Table, Wrapped};

use super::models::YahooChartMeta;

/// Convert an arbitrary Yahoo JSON value.
pub fn from_json(value: &Value) -> ProviderValue {
    match value {
        Value::Null => ProviderValue::Null,
        Value::Bool(b) => ProviderValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ProviderValue::Int(i),
            None => ProviderValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ProviderValue::Str(s.clone()),
        Value::Array(items) => ProviderValue::Sequence(items.iter().map(from_json).collect()),
        Value::Object(object) => from_object(object),
    }
}

fn from_object(object: &Map<String, Value>) -> ProviderValue {
    let repr = object
        .get("fmt")
        .or_else(|| object.get("longFmt"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match object.get("raw") {
        Some(Value::Array(items)) => {
            let repr = repr.unwrap_or_else(|| Value::Array(items.clone()).to_string());
            ProviderValue::Array(Wrapped::extracted(
                items.iter().map(from_json).collect(),
                repr,
            ))
        }
        Some(raw) => {
            let repr = repr.unwrap_or_else(|| raw.to_string());
            ProviderValue::Scalar(Wrapped::extracted(Box::new(from_json(raw)), repr))
        }
        // Formatted-only values carry nothing to extract
        None if object.len() == 1 && repr.is_some() => {
            ProviderValue::Scalar(Wrapped::opaque(repr.unwrap_or_default()))
        }
        None => ProviderValue::Map(
            object
                .iter()
                .map(|(k, v)| (ProviderValue::Str(k.clone()), from_json(v)))
                .collect(),
        ),
    }
}

fn raw(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Object(object) => object.get("raw"),
        other => Some(other),
    }
}

fn raw_i64(value: Option<&Value>) -> Option<i64> {
    raw(value).and_then(Value::as_i64)
}

/// Calendar date of a unix timestamp, in UTC.
pub fn date_from_unix(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// A unix timestamp as a UTC-pinned date-time.
pub fn timestamp_value(ts: i64) -> ProviderValue {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => ProviderValue::ZonedDateTime(dt.fixed_offset()),
        None => ProviderValue::Int(ts),
    }
}

fn unix_date_value(value: Option<&Value>) -> ProviderValue {
    match raw_i64(value).and_then(date_from_unix) {
        Some(date) => ProviderValue::Date(date),
        None => value.map(from_json).unwrap_or(ProviderValue::Null),
    }
}

/// Merge quoteSummary modules into one flat metadata map.
///
/// Keys keep the order of `modules` and then of each module body. Empty
/// values and `maxAge` bookkeeping are dropped; the first module to report
/// a key wins.
pub fn flatten_modules(result: &Map<String, Value>, modules: &[&str]) -> ProviderValue {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for module in modules {
        let Some(Value::Object(body)) = result.get(*module) else {
            continue;
        };
        for (key, value) in body {
            if key == "maxAge" || is_empty_object(value) {
                continue;
            }
            if seen.insert(key.as_str()) {
                entries.push((ProviderValue::Str(key.clone()), from_json(value)));
            }
        }
    }

    ProviderValue::Map(entries)
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(object) if object.is_empty())
}

fn list<'a>(module: &'a Value, key: &str) -> &'a [Value] {
    module
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `recommendationTrend` as a table, one row per trend period.
pub fn recommendations_table(module: &Value) -> Table {
    const COLUMNS: [&str; 6] = ["period", "strongBuy", "buy", "hold", "sell", "strongSell"];

    let mut table = Table::with_columns(COLUMNS);
    for (i, entry) in list(module, "trend").iter().enumerate() {
        let cells = COLUMNS
            .iter()
            .map(|c| entry.get(*c).map(from_json).unwrap_or(ProviderValue::Null))
            .collect();
        table.push_row(ProviderValue::Int(i as i64), cells);
    }
    table
}

/// `institutionOwnership` as a table of holders.
pub fn institutional_holders_table(module: &Value) -> Table {
    let mut table = Table::with_columns([
        "Date Reported",
        "Holder",
        "pctHeld",
        "Shares",
        "Value",
        "pctChange",
    ]);
    for (i, entry) in list(module, "ownershipList").iter().enumerate() {
        let field = |key: &str| entry.get(key).map(from_json).unwrap_or(ProviderValue::Null);
        table.push_row(
            ProviderValue::Int(i as i64),
            vec![
                unix_date_value(entry.get("reportDate")),
                field("organization"),
                field("pctHeld"),
                field("position"),
                field("value"),
                field("pctChange"),
            ],
        );
    }
    table
}

/// `majorHoldersBreakdown` as a one-column table keyed by breakdown name.
pub fn major_holders_table(module: &Value) -> Table {
    const BREAKDOWN: [&str; 4] = [
        "insidersPercentHeld",
        "institutionsPercentHeld",
        "institutionsFloatPercentHeld",
        "institutionsCount",
    ];

    let mut table = Table::with_columns(["Value"]);
    for key in BREAKDOWN {
        if let Some(value) = module.get(key) {
            table.push_row(ProviderValue::str(key), vec![from_json(value)]);
        }
    }
    table
}

/// `calendarEvents` as a map of upcoming dates and estimates.
pub fn calendar_map(module: &Value) -> ProviderValue {
    let mut entries: Vec<(&str, ProviderValue)> = Vec::new();

    if module.get("dividendDate").is_some() {
        entries.push(("Dividend Date", unix_date_value(module.get("dividendDate"))));
    }
    if module.get("exDividendDate").is_some() {
        entries.push((
            "Ex-Dividend Date",
            unix_date_value(module.get("exDividendDate")),
        ));
    }

    if let Some(earnings) = module.get("earnings") {
        let dates = list(earnings, "earningsDate")
            .iter()
            .map(|d| unix_date_value(Some(d)))
            .collect();
        entries.push(("Earnings Date", ProviderValue::Sequence(dates)));

        for (key, label) in [
            ("earningsHigh", "Earnings High"),
            ("earningsLow", "Earnings Low"),
            ("earningsAverage", "Earnings Average"),
            ("revenueHigh", "Revenue High"),
            ("revenueLow", "Revenue Low"),
            ("revenueAverage", "Revenue Average"),
        ] {
            if let Some(value) = earnings.get(key).filter(|v| !is_empty_object(v)) {
                entries.push((label, from_json(value)));
            }
        }
    }

    ProviderValue::map(entries)
}

fn push_some<T: Into<ProviderValue>>(
    entries: &mut Vec<(&'static str, ProviderValue)>,
    key: &'static str,
    value: Option<T>,
) {
    if let Some(value) = value {
        entries.push((key, value.into()));
    }
}

/// Quick quote snapshot derived from chart metadata.
pub fn fast_info(meta: &YahooChartMeta) -> ProviderValue {
    let text = |v: &Option<String>| ProviderValue::from(v.as_deref());
    ProviderValue::map([
        ("currency", text(&meta.currency)),
        ("dayHigh", meta.regular_market_day_high.into()),
        ("dayLow", meta.regular_market_day_low.into()),
        ("exchange", text(&meta.exchange_name)),
        ("lastPrice", meta.regular_market_price.into()),
        ("lastVolume", meta.regular_market_volume.into()),
        ("previousClose", meta.chart_previous_close.into()),
        ("quoteType", text(&meta.instrument_type)),
        ("regularMarketPreviousClose", meta.previous_close.into()),
        ("timezone", text(&meta.exchange_timezone_name)),
        ("yearHigh", meta.fifty_two_week_high.into()),
        ("yearLow", meta.fifty_two_week_low.into()),
    ])
}

/// Metadata map built from chart metadata when quoteSummary is unavailable.
pub fn chart_info(meta: &YahooChartMeta) -> ProviderValue {
    let mut entries = Vec::new();
    push_some(&mut entries, "currency", meta.currency.as_deref());
    push_some(&mut entries, "symbol", meta.symbol.as_deref());
    push_some(&mut entries, "exchange", meta.exchange_name.as_deref());
    push_some(
        &mut entries,
        "fullExchangeName",
        meta.full_exchange_name.as_deref(),
    );
    push_some(&mut entries, "quoteType", meta.instrument_type.as_deref());
    push_some(&mut entries, "longName", meta.long_name.as_deref());
    push_some(&mut entries, "shortName", meta.short_name.as_deref());
    push_some(
        &mut entries,
        "exchangeTimezoneName",
        meta.exchange_timezone_name.as_deref(),
    );
    push_some(&mut entries, "regularMarketPrice", meta.regular_market_price);
    push_some(&mut entries, "previousClose", meta.previous_close);
    push_some(&mut entries, "fiftyTwoWeekHigh", meta.fifty_two_week_high);
    push_some(&mut entries, "fiftyTwoWeekLow", meta.fifty_two_week_low);
    push_some(&mut entries, "regularMarketTime", meta.regular_market_time);
    ProviderValue::map(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, table_to_payload};
    use serde_json::json;

    #[test]
    fn test_raw_fmt_objects_become_scalar_wrappers() {
        let value = from_json(&json!({"raw": 2.95e12, "fmt": "2.95T", "longFmt": "2,950,000,000,000"}));
        let ProviderValue::Scalar(wrapped) = &value else {
            panic!("expected scalar wrapper");
        };
        assert_eq!(wrapped.repr(), "2.95T");
        assert_eq!(normalize(&value), json!(2.95e12));
    }

    #[test]
    fn test_fmt_only_object_falls_back_to_string() {
        assert_eq!(normalize(&from_json(&json!({"fmt": "N/A"}))), json!("N/A"));
    }

    #[test]
    fn test_raw_array_becomes_array_wrapper() {
        let value = from_json(&json!({"raw": [1, 2], "fmt": "1, 2"}));
        assert!(matches!(value, ProviderValue::Array(_)));
        assert_eq!(normalize(&value), json!([1, 2]));
    }

    #[test]
    fn test_plain_objects_stay_maps() {
        let value = from_json(&json!({"name": "Tim Cook", "age": 62}));
        assert_eq!(normalize(&value), json!({"name": "Tim Cook", "age": 62}));
    }

    #[test]
    fn test_flatten_modules_first_wins_and_skips_empty() {
        let result = json!({
            "summaryDetail": {"maxAge": 1, "currency": "USD", "beta": {"raw": 1.29, "fmt": "1.29"}, "yield": {}},
            "price": {"currency": "EUR", "longName": "Apple Inc."}
        });
        let info = flatten_modules(result.as_object().unwrap(), &["summaryDetail", "price"]);
        let normalized = normalize(&info);
        assert_eq!(
            normalized,
            json!({"currency": "USD", "beta": 1.29, "longName": "Apple Inc."})
        );
        let keys: Vec<&String> = normalized.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["currency", "beta", "longName"]);
    }

    #[test]
    fn test_recommendations_table() {
        let module = json!({"trend": [
            {"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0},
            {"period": "-1m", "strongBuy": 10, "buy": 20, "hold": 7, "sell": 1}
        ]});
        let payload = table_to_payload(Some(&recommendations_table(&module))).unwrap();
        assert_eq!(payload["index"], json!([0, 1]));
        assert_eq!(payload["data"][1], json!(["-1m", 10, 20, 7, 1, null]));
    }

    #[test]
    fn test_institutional_holders_dates() {
        let module = json!({"ownershipList": [{
            "reportDate": {"raw": 1711843200, "fmt": "2024-03-31"},
            "organization": "Vanguard Group Inc",
            "pctHeld": {"raw": 0.0837, "fmt": "8.37%"},
            "position": {"raw": 1293000000, "fmt": "1.29B"},
            "value": {"raw": 221700000000_i64, "fmt": "221.7B"}
        }]});
        let payload = table_to_payload(Some(&institutional_holders_table(&module))).unwrap();
        assert_eq!(
            payload["data"][0],
            json!(["2024-03-31", "Vanguard Group Inc", 0.0837, 1293000000, 221700000000_i64, null])
        );
    }

    #[test]
    fn test_major_holders_skips_missing_rows() {
        let module = json!({
            "insidersPercentHeld": {"raw": 0.0207, "fmt": "2.07%"},
            "institutionsCount": {"raw": 6420, "fmt": "6.42k"}
        });
        let payload = table_to_payload(Some(&major_holders_table(&module))).unwrap();
        assert_eq!(
            payload,
            json!({
                "columns": ["Value"],
                "index": ["insidersPercentHeld", "institutionsCount"],
                "data": [[0.0207], [6420]]
            })
        );
    }

    #[test]
    fn test_calendar_map() {
        let module = json!({
            "earnings": {
                "earningsDate": [{"raw": 1714651200, "fmt": "2024-05-02"}],
                "earningsAverage": {"raw": 1.5, "fmt": "1.50"},
                "revenueHigh": {}
            },
            "exDividendDate": {"raw": 1715299200, "fmt": "2024-05-10"}
        });
        assert_eq!(
            normalize(&calendar_map(&module)),
            json!({
                "Ex-Dividend Date": "2024-05-10",
                "Earnings Date": ["2024-05-02"],
                "Earnings Average": 1.5
            })
        );
    }

    #[test]
    fn test_fast_info_keeps_every_key() {
        let meta = YahooChartMeta {
            currency: Some("USD".to_string()),
            regular_market_price: Some(189.84),
            ..Default::default()
        };
        let normalized = normalize(&fast_info(&meta));
        assert_eq!(normalized["currency"], json!("USD"));
        assert_eq!(normalized["lastPrice"], json!(189.84));
        assert_eq!(normalized["yearLow"], Value::Null);
        assert_eq!(normalized.as_object().unwrap().len(), 12);
    }

    #[test]
    fn test_chart_info_only_reports_present_fields() {
        let meta = YahooChartMeta {
            currency: Some("JPY".to_string()),
            symbol: Some("7203.T".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&chart_info(&meta)),
            json!({"currency": "JPY", "symbol": "7203.T"})
        );
    }

    #[test]
    fn test_timestamp_value_is_utc() {
        assert_eq!(
            normalize(&timestamp_value(1704205800)),
            json!("2024-01-02T14:30:00+00:00")
        );
        assert_eq!(
            date_from_unix(1704205800),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }
}
