use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{Frequency, HistoryQuery, StatementKind, Table};
use crate::normalize::{normalize, normalize_metadata, series_to_payload, table_to_payload};
use crate::protocol::{integer_field, ticker_field, RequestArgs, RequestError, Response};
use crate::provider::TickerDataSource;

use super::fetched_at;

/// Source tag carried by snapshot responses.
pub const SNAPSHOT_SOURCE: &str = "yfinance";

pub const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub ticker: String,
    /// Days of recent history, at least 1.
    pub history_days: u32,
}

impl SnapshotRequest {
    pub fn from_args(args: &RequestArgs) -> Result<Self, RequestError> {
        let ticker = ticker_field(args)?;
        let history_days = integer_field(args, "history_days")
            .map(|days| days.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(DEFAULT_HISTORY_DAYS);
        Ok(Self {
            ticker,
            history_days,
        })
    }
}

/// Snapshot payload. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPayload {
    pub ticker: String,
    pub fetched_at: String,
    pub info: Value,
    pub fast_info: Value,
    pub history: Value,
    pub dividends: Value,
    pub financials: Value,
    pub quarterly_financials: Value,
    pub balance_sheet: Value,
    pub quarterly_balance_sheet: Value,
    pub cashflow: Value,
    pub quarterly_cashflow: Value,
    pub recommendations: Value,
    pub institutional_holders: Value,
    pub major_holders: Value,
    pub calendar: Value,
}

/// Run the snapshot pipeline for one request.
pub async fn fetch_snapshot<S, F>(args: &RequestArgs, connect: F) -> Response<SnapshotPayload>
where
    S: TickerDataSource,
    F: FnOnce() -> Result<S, MarketDataError>,
{
    let request = match SnapshotRequest::from_args(args) {
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

    match snapshot(&source, &request).await {
        Ok(payload) => Response::sourced(SNAPSHOT_SOURCE, payload),
        Err(e) => {
            warn!("Snapshot for {} failed: {}", request.ticker, e);
            e.into()
        }
    }
}

/// Collect every dataset for `request.ticker`.
///
/// `info` and `history` are required; any other dataset that fails is
/// reported as `null` (`fast_info` as `{}`).
pub async fn snapshot<S>(
    source: &S,
    request: &SnapshotRequest,
) -> Result<SnapshotPayload, MarketDataError>
where
    S: TickerDataSource + ?Sized,
{
    let ticker = request.ticker.as_str();
    debug!(
        "Fetching snapshot for {} ({} days) from {}",
        ticker,
        request.history_days,
        source.id()
    );

    let info = source.info(ticker).await?;
    let history = source
        .history(ticker, &HistoryQuery::last_days(request.history_days))
        .await?;

    let fast_info = optional("fast_info", ticker, source.fast_info(ticker).await)
        .map(|v| normalize_metadata(&v))
        .unwrap_or_else(|| Value::Object(Map::new()));
    let dividends = optional("dividends", ticker, source.dividends(ticker).await).flatten();

    let statement = |kind: StatementKind, frequency: Frequency| async move {
        let name = format!("{:?} {} statement", kind, frequency.as_str());
        let table = optional(&name, ticker, source.statement(ticker, kind, frequency).await);
        table_value(table.flatten())
    };

    Ok(SnapshotPayload {
        ticker: request.ticker.clone(),
        fetched_at: fetched_at(),
        info: normalize_metadata(&info),
        fast_info,
        history: table_value(history),
        dividends: series_to_payload(dividends.as_ref()).unwrap_or(Value::Null),
        financials: statement(StatementKind::Income, Frequency::Annual).await,
        quarterly_financials: statement(StatementKind::Income, Frequency::Quarterly).await,
        balance_sheet: statement(StatementKind::BalanceSheet, Frequency::Annual).await,
        quarterly_balance_sheet: statement(StatementKind::BalanceSheet, Frequency::Quarterly)
            .await,
        cashflow: statement(StatementKind::CashFlow, Frequency::Annual).await,
        quarterly_cashflow: statement(StatementKind::CashFlow, Frequency::Quarterly).await,
        recommendations: table_value(
            optional("recommendations", ticker, source.recommendations(ticker).await).flatten(),
        ),
        institutional_holders: table_value(
            optional(
                "institutional_holders",
                ticker,
                source.institutional_holders(ticker).await,
            )
            .flatten(),
        ),
        major_holders: table_value(
            optional("major_holders", ticker, source.major_holders(ticker).await).flatten(),
        ),
        calendar: optional("calendar", ticker, source.calendar(ticker).await)
            .map(|v| normalize(&v))
            .unwrap_or(Value::Null),
    })
}

fn table_value(table: Option<Table>) -> Value {
    table_to_payload(table.as_ref()).unwrap_or(Value::Null)
}

/// Collapse an optional dataset fetch, logging the failure.
fn optional<T>(field: &str, ticker: &str, result: Result<T, MarketDataError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to fetch {} for {}: {}", field, ticker, e);
            None
        }
    }
}
