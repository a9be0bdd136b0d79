use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{
    HistoryQuery, HistoryWindow, ProviderValue, Table, DEFAULT_INTERVAL, DEFAULT_PERIOD,
};
use crate::normalize::normalize;
use crate::protocol::{strict, string_field, ticker_field, RequestArgs, RequestError, Response};
use crate::provider::TickerDataSource;

use super::fetched_at;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryRequest {
    pub ticker: String,
    /// Raw `start_date`, parsed when the window is built.
    pub start_date: Option<String>,
    pub period: String,
    pub interval: String,
}

impl PriceHistoryRequest {
    pub fn from_args(args: &RequestArgs) -> Result<Self, RequestError> {
        Ok(Self {
            ticker: ticker_field(args)?,
            start_date: string_field(args, "start_date"),
            period: string_field(args, "period").unwrap_or_else(|| DEFAULT_PERIOD.to_string()),
            interval: string_field(args, "interval")
                .unwrap_or_else(|| DEFAULT_INTERVAL.to_string()),
        })
    }

    /// `start_date` wins over `period`; with neither, the full history is
    /// requested.
    pub fn window(&self) -> Result<HistoryWindow, MarketDataError> {
        match &self.start_date {
            Some(start) => parse_start_date(start).map(HistoryWindow::Start),
            None => Ok(HistoryWindow::Period(self.period.clone())),
        }
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_start_date(raw: &str) -> Result<NaiveDate, MarketDataError> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| MarketDataError::InvalidWindow {
        name: "start_date",
        value: raw.to_string(),
    })
}

/// One output row. Prices and volume are `null` when unavailable; the
/// corporate action columns default to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub date: String,
    #[serde(serialize_with = "strict::finite_option")]
    pub open: Option<f64>,
    #[serde(serialize_with = "strict::finite_option")]
    pub high: Option<f64>,
    #[serde(serialize_with = "strict::finite_option")]
    pub low: Option<f64>,
    #[serde(serialize_with = "strict::finite_option")]
    pub close: Option<f64>,
    #[serde(serialize_with = "strict::finite_option")]
    pub adjusted_close: Option<f64>,
    #[serde(serialize_with = "strict::finite_option")]
    pub volume: Option<f64>,
    #[serde(serialize_with = "strict::finite")]
    pub dividends: f64,
    #[serde(serialize_with = "strict::finite")]
    pub stock_splits: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPayload {
    pub ticker: String,
    pub currency: Value,
    pub fetched_at: String,
    pub rows: Vec<PriceRow>,
}

/// Coerce a cell to a finite float.
pub fn to_number(value: &ProviderValue) -> Option<f64> {
    let number = match value {
        ProviderValue::Int(i) => *i as f64,
        ProviderValue::Float(f) => *f,
        ProviderValue::Bool(b) => f64::from(u8::from(*b)),
        ProviderValue::Str(s) => s.trim().parse().ok()?,
        ProviderValue::Scalar(wrapped) => return wrapped.extract().and_then(|v| to_number(v)),
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Calendar date of a history index label, in UTC.
pub fn index_to_utc_date(label: &ProviderValue) -> Option<String> {
    let date = match label {
        ProviderValue::Null => return None,
        ProviderValue::ZonedDateTime(dt) => dt.with_timezone(&Utc).date_naive(),
        ProviderValue::DateTime(dt) => dt.date(),
        ProviderValue::Date(d) => *d,
        ProviderValue::Scalar(wrapped) => {
            return match wrapped.extract() {
                Some(inner) => index_to_utc_date(inner),
                None => display_date(label),
            };
        }
        other => return display_date(other),
    };
    Some(date.format("%Y-%m-%d").to_string())
}

/// First ten characters of the display form, or `None` when it is blank.
fn display_date(label: &ProviderValue) -> Option<String> {
    let text = label.to_string();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(10).collect())
}

/// Flatten a history table into output rows, skipping undated rows.
pub fn rows_from_table(table: &Table) -> Vec<PriceRow> {
    table
        .rows()
        .filter_map(|row| {
            let Some(date) = index_to_utc_date(row.label()) else {
                debug!("Skipping history row with index {:?}", row.label());
                return None;
            };
            let number = |column: &str| row.get(column).and_then(to_number);
            Some(PriceRow {
                date,
                open: number("Open"),
                high: number("High"),
                low: number("Low"),
                close: number("Close"),
                adjusted_close: number("Adj Close"),
                volume: number("Volume"),
                dividends: number("Dividends").unwrap_or(0.0),
                stock_splits: number("Stock Splits").unwrap_or(0.0),
            })
        })
        .collect()
}

/// Run the price history pipeline for one request.
pub async fn fetch_price_history<S, F>(
    args: &RequestArgs,
    connect: F,
) -> Response<HistoryPayload>
where
    S: TickerDataSource,
    F: FnOnce() -> Result<S, MarketDataError>,
{
    let request = match PriceHistoryRequest::from_args(args) {
        Ok(request) => request,
        Err(e) => return e.into(),
    };
    let source = match connect() {
        Ok(source) => source,
        Err(e) => {
            warn!("Market data provider unavailable: {}", e);
            return e.into();
        }
    };

    match price_history(&source, &request).await {
        Ok(payload) => Response::success(payload),
        Err(e) => {
            warn!("Price history for {} failed: {}", request.ticker, e);
            e.into()
        }
    }
}

/// Fetch unadjusted history with actions, then the instrument currency.
pub async fn price_history<S>(
    source: &S,
    request: &PriceHistoryRequest,
) -> Result<HistoryPayload, MarketDataError>
where
    S: TickerDataSource + ?Sized,
{
    let window = request.window()?;
    debug!(
        "Fetching price history for {} ({}, interval {}) from {}",
        request.ticker,
        window,
        request.interval,
        source.id()
    );

    let query = HistoryQuery::new(window, request.interval.clone());
    let table = source.history(&request.ticker, &query).await?;
    let rows = table.as_ref().map(rows_from_table).unwrap_or_default();

    let info = source.info(&request.ticker).await?;
    let currency = info.get("currency").map(normalize).unwrap_or(Value::Null);

    Ok(HistoryPayload {
        ticker: request.ticker.clone(),
        currency,
        fetched_at: fetched_at(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Wrapped;
    use chrono::{DateTime, NaiveDateTime};
    use serde_json::json;

    fn args(value: Value) -> RequestArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn window(value: Value) -> Result<HistoryWindow, MarketDataError> {
        PriceHistoryRequest::from_args(&args(value)).unwrap().window()
    }

    #[test]
    fn test_window_priority() {
        assert_eq!(
            window(json!({"ticker": "ACME", "start_date": "2020-01-01", "period": "5y"}))
                .unwrap(),
            HistoryWindow::Start(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );

        let request =
            PriceHistoryRequest::from_args(&args(json!({"ticker": "ACME", "period": "5y"})))
                .unwrap();
        assert_eq!(request.window().unwrap(), HistoryWindow::Period("5y".to_string()));
        assert_eq!(request.interval, "1d");

        let request = PriceHistoryRequest::from_args(&args(json!({
            "ticker": "ACME", "start_date": "  ", "interval": "1wk"
        })))
        .unwrap();
        assert_eq!(request.window().unwrap(), HistoryWindow::Period("max".to_string()));
        assert_eq!(request.interval, "1wk");
    }

    #[test]
    fn test_start_date_with_time_part() {
        assert_eq!(
            window(json!({"ticker": "ACME", "start_date": "2021-06-30T00:00:00Z"})).unwrap(),
            HistoryWindow::Start(NaiveDate::from_ymd_opt(2021, 6, 30).unwrap())
        );
    }

    #[test]
    fn test_bad_start_date_fails_at_window() {
        // The request itself is accepted; only building the window fails
        let err = window(json!({"ticker": "ACME", "start_date": "last tuesday"})).unwrap_err();
        assert!(!err.is_unavailable());
        assert_eq!(
            err.to_string(),
            r#"Invalid start_date "last tuesday": expected a YYYY-MM-DD date"#
        );
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&ProviderValue::Int(1200)), Some(1200.0));
        assert_eq!(to_number(&ProviderValue::str(" 12.5 ")), Some(12.5));
        assert_eq!(to_number(&ProviderValue::Bool(true)), Some(1.0));
        assert_eq!(to_number(&ProviderValue::Float(f64::NAN)), None);
        assert_eq!(to_number(&ProviderValue::Float(f64::NEG_INFINITY)), None);
        assert_eq!(to_number(&ProviderValue::str("inf")), None);
        assert_eq!(to_number(&ProviderValue::str("n/a")), None);
        assert_eq!(to_number(&ProviderValue::Null), None);
        assert_eq!(
            to_number(&ProviderValue::Scalar(Wrapped::extracted(
                Box::new(ProviderValue::Float(3.5)),
                "3.5"
            ))),
            Some(3.5)
        );
        assert_eq!(
            to_number(&ProviderValue::Scalar(Wrapped::opaque("3.5"))),
            None
        );
    }

    #[test]
    fn test_index_to_utc_date() {
        // 23:30 at -05:00 is already the next day in UTC
        let zoned = DateTime::parse_from_rfc3339("2024-03-01T23:30:00-05:00").unwrap();
        assert_eq!(
            index_to_utc_date(&ProviderValue::ZonedDateTime(zoned)).as_deref(),
            Some("2024-03-02")
        );

        let naive =
            NaiveDateTime::parse_from_str("2024-03-01 23:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            index_to_utc_date(&ProviderValue::DateTime(naive)).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            index_to_utc_date(&ProviderValue::str("2024-03-01 00:00:00")).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(index_to_utc_date(&ProviderValue::str("   ")), None);
        assert_eq!(index_to_utc_date(&ProviderValue::Null), None);
    }

    #[test]
    fn test_index_to_utc_date_unwraps_scalars() {
        let zoned = DateTime::parse_from_rfc3339("2024-03-01T23:30:00-05:00").unwrap();
        let wrapped = ProviderValue::Scalar(Wrapped::extracted(
            Box::new(ProviderValue::ZonedDateTime(zoned)),
            "Timestamp('2024-03-01 23:30:00-0500')",
        ));
        assert_eq!(index_to_utc_date(&wrapped).as_deref(), Some("2024-03-02"));

        // Nothing to extract: the display form is used
        let opaque = ProviderValue::Scalar(Wrapped::opaque("2024-03-01 23:30:00-0500"));
        assert_eq!(index_to_utc_date(&opaque).as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn test_rows_from_table() {
        let mut table = Table::with_columns(["Open", "Close", "Volume", "Dividends"]);
        table.push_row(
            ProviderValue::str("2024-01-02"),
            vec![
                ProviderValue::Float(10.0),
                ProviderValue::Float(f64::NAN),
                ProviderValue::str("lots"),
                ProviderValue::Null,
            ],
        );
        table.push_row(
            ProviderValue::Null,
            vec![
                ProviderValue::Float(1.0),
                ProviderValue::Float(1.0),
                ProviderValue::Int(1),
                ProviderValue::Float(0.0),
            ],
        );

        let rows = rows_from_table(&table);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, "2024-01-02");
        assert_eq!(row.open, Some(10.0));
        assert_eq!(row.close, None);
        assert_eq!(row.volume, None);
        assert_eq!(row.high, None);
        assert_eq!(row.dividends, 0.0);
        assert_eq!(row.stock_splits, 0.0);
    }
}
