//! Assembly of price history tables from chart bars and corporate actions.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{ProviderValue, Series, Table};

use super::convert::{date_from_unix, timestamp_value};

pub const HISTORY_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Adj Close", "Volume"];
pub const ACTION_COLUMNS: [&str; 2] = ["Dividends", "Stock Splits"];

/// One OHLCV bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// A dividend payment or split ratio at a point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionEvent {
    pub timestamp: i64,
    pub value: f64,
}

impl From<yahoo_finance_api::Quote> for Bar {
    fn from(quote: yahoo_finance_api::Quote) -> Self {
        Self {
            timestamp: quote.timestamp as i64,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            adj_close: quote.adjclose,
            volume: quote.volume,
        }
    }
}

fn by_date(events: &[ActionEvent]) -> HashMap<NaiveDate, f64> {
    let mut out = HashMap::new();
    for event in events {
        if let Some(date) = date_from_unix(event.timestamp) {
            *out.entry(date).or_insert(0.0) += event.value;
        }
    }
    out
}

fn volume_value(volume: u64) -> ProviderValue {
    match i64::try_from(volume) {
        Ok(v) => ProviderValue::Int(v),
        Err(_) => ProviderValue::Float(volume as f64),
    }
}

/// Build the history table, oldest bar first.
///
/// Bars are indexed by their UTC timestamp. With `actions` set, dividends
/// and splits are attached to the bar sharing their UTC calendar date, and
/// bars without an event get `0.0`.
pub fn history_table(
    bars: &[Bar],
    dividends: &[ActionEvent],
    splits: &[ActionEvent],
    actions: bool,
) -> Table {
    let mut table = if actions {
        Table::with_columns(HISTORY_COLUMNS.into_iter().chain(ACTION_COLUMNS))
    } else {
        Table::with_columns(HISTORY_COLUMNS)
    };

    let dividends = by_date(dividends);
    let splits = by_date(splits);

    let mut bars: Vec<&Bar> = bars.iter().collect();
    bars.sort_by_key(|bar| bar.timestamp);

    for bar in bars {
        let mut cells = vec![
            ProviderValue::Float(bar.open),
            ProviderValue::Float(bar.high),
            ProviderValue::Float(bar.low),
            ProviderValue::Float(bar.close),
            ProviderValue::Float(bar.adj_close),
            volume_value(bar.volume),
        ];
        if actions {
            let date = date_from_unix(bar.timestamp);
            let lookup = |events: &HashMap<NaiveDate, f64>| {
                date.and_then(|d| events.get(&d).copied()).unwrap_or(0.0)
            };
            cells.push(ProviderValue::Float(lookup(&dividends)));
            cells.push(ProviderValue::Float(lookup(&splits)));
        }
        table.push_row(timestamp_value(bar.timestamp), cells);
    }

    table
}

/// Dividend payments as a date-keyed series, oldest first.
pub fn dividend_series(dividends: &[ActionEvent]) -> Series {
    let mut events: Vec<&ActionEvent> = dividends.iter().collect();
    events.sort_by_key(|event| event.timestamp);

    Series::new(
        events
            .into_iter()
            .map(|event| {
                (
                    timestamp_value(event.timestamp),
                    ProviderValue::Float(event.value),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{series_to_payload, table_to_payload};
    use serde_json::json;

    // 2024-01-02 and 2024-01-03, 14:30 UTC
    const DAY1: i64 = 1704205800;
    const DAY2: i64 = DAY1 + 86_400;

    fn bar(timestamp: i64, close: f64) -> Bar {
        Bar {
            timestamp,
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_columns_without_actions() {
        let table = history_table(&[bar(DAY1, 10.0)], &[], &[], false);
        let payload = table_to_payload(Some(&table)).unwrap();
        assert_eq!(
            payload["columns"],
            json!(["Open", "High", "Low", "Close", "Adj Close", "Volume"])
        );
        assert_eq!(payload["index"], json!(["2024-01-02T14:30:00+00:00"]));
        assert_eq!(payload["data"][0], json!([9.0, 11.0, 8.0, 10.0, 10.0, 1000]));
    }

    #[test]
    fn test_actions_attach_by_utc_date() {
        // Dividend stamped at midnight UTC still lands on the 14:30 bar
        let dividends = [ActionEvent {
            timestamp: DAY2 - 52_200,
            value: 0.24,
        }];
        let splits = [ActionEvent {
            timestamp: DAY1,
            value: 4.0,
        }];
        let table = history_table(&[bar(DAY2, 11.0), bar(DAY1, 10.0)], &dividends, &splits, true);

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Stock Splits"), Some(&ProviderValue::Float(4.0)));
        assert_eq!(rows[0].get("Dividends"), Some(&ProviderValue::Float(0.0)));
        assert_eq!(rows[1].get("Dividends"), Some(&ProviderValue::Float(0.24)));
        assert_eq!(rows[1].get("Stock Splits"), Some(&ProviderValue::Float(0.0)));
    }

    #[test]
    fn test_no_bars_gives_empty_table() {
        let table = history_table(&[], &[], &[], true);
        assert!(table.is_empty());
        assert_eq!(table.width(), 8);
    }

    #[test]
    fn test_dividend_series_sorted() {
        let series = dividend_series(&[
            ActionEvent {
                timestamp: DAY2,
                value: 0.25,
            },
            ActionEvent {
                timestamp: DAY1,
                value: 0.24,
            },
        ]);
        let payload = series_to_payload(Some(&ProviderValue::Series(series))).unwrap();
        assert_eq!(
            payload,
            json!([
                {"date": "2024-01-02T14:30:00+00:00", "value": 0.24},
                {"date": "2024-01-03T14:30:00+00:00", "value": 0.25}
            ])
        );
    }
}
