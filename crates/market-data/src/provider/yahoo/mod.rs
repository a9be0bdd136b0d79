//! Yahoo Finance ticker data source.
//!
//! Price history and dividends go through the `yahoo_finance_api` chart
//! client. Metadata, holders, recommendations and the calendar come from the
//! quoteSummary endpoint, which needs a crumb/cookie pair; statements come
//! from the fundamentals timeseries endpoint.

pub mod convert;
pub mod history;
mod models;
pub mod statements;

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, warn};
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::config::Config;
use crate::errors::MarketDataError;
use crate::models::{
    Frequency, HistoryQuery, HistoryWindow, ProviderValue, StatementKind, Table,
};
use crate::provider::TickerDataSource;

use history::{ActionEvent, Bar};
use models::{
    YahooChartMeta, YahooChartResponse, YahooQuoteSummaryResponse, YahooTimeseriesResponse,
};

const PROVIDER_ID: &str = "YAHOO";

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// quoteSummary modules merged into `info`, in precedence order.
const INFO_MODULES: &[&str] = &[
    "assetProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "price",
    "quoteType",
];

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

/// Yahoo Finance data source.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    client: reqwest::Client,
    crumb: RwLock<Option<CrumbData>>,
    statement_years: u32,
}

impl YahooProvider {
    /// Create the provider. Fails with `ProviderUnavailable` when the HTTP
    /// stack cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| unavailable(format!("Failed to initialize Yahoo connector: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            connector,
            client,
            crumb: RwLock::new(None),
            statement_years: config.statement_years,
        })
    }

    // ========================================================================
    // Crumb/Cookie Authentication
    // ========================================================================

    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        let cached = self.crumb.read().ok().and_then(|guard| guard.clone());
        match cached {
            Some(crumb) => Ok(crumb),
            None => self.fetch_crumb().await,
        }
    }

    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        // Step 1: cookie from fc.yahoo.com (the page itself 404s)
        let response = self.client.get(COOKIE_URL).send().await.map_err(|e| {
            MarketDataError::provider(PROVIDER_ID, format!("Failed to get cookie: {}", e))
        })?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::provider(PROVIDER_ID, "Failed to parse Yahoo cookie"))?;

        // Step 2: crumb for that cookie
        let crumb = self
            .client
            .get(CRUMB_URL)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| {
                MarketDataError::provider(PROVIDER_ID, format!("Failed to get crumb: {}", e))
            })?
            .text()
            .await
            .map_err(|e| {
                MarketDataError::provider(PROVIDER_ID, format!("Failed to read crumb: {}", e))
            })?;

        let crumb_data = CrumbData { cookie, crumb };
        if let Ok(mut guard) = self.crumb.write() {
            *guard = Some(crumb_data.clone());
        }
        Ok(crumb_data)
    }

    fn clear_crumb(&self) {
        if let Ok(mut guard) = self.crumb.write() {
            *guard = None;
        }
    }

    // ========================================================================
    // Raw endpoints
    // ========================================================================

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<T, MarketDataError> {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.clear_crumb();
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                "Yahoo authentication expired",
            ));
        }

        // Unknown symbols come back as 404 with a JSON error body
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                MarketDataError::malformed(PROVIDER_ID, e.to_string())
            } else {
                MarketDataError::provider(PROVIDER_ID, format!("HTTP {}", status))
            }
        })
    }

    async fn quote_summary(
        &self,
        symbol: &str,
        modules: &[&str],
    ) -> Result<Map<String, Value>, MarketDataError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!(
            "{}/{}?modules={}&crumb={}",
            QUOTE_SUMMARY_URL,
            encode(symbol),
            modules.join(","),
            encode(&crumb.crumb)
        );

        let data: YahooQuoteSummaryResponse = self.get_json(&url, Some(&crumb.cookie)).await?;
        let summary = data.quote_summary;
        match summary.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(result),
            None => Err(match summary.error {
                Some(e) if e.code.as_deref() != Some("Not Found") => {
                    MarketDataError::provider(PROVIDER_ID, e.message())
                }
                _ => MarketDataError::SymbolNotFound(symbol.to_string()),
            }),
        }
    }

    /// A single quoteSummary module. `None` when Yahoo has no such module
    /// for the symbol.
    async fn quote_summary_module(
        &self,
        symbol: &str,
        module: &str,
    ) -> Result<Option<Value>, MarketDataError> {
        let mut result = self.quote_summary(symbol, &[module]).await?;
        Ok(result.remove(module))
    }

    async fn chart_meta(&self, symbol: &str) -> Result<YahooChartMeta, MarketDataError> {
        let url = format!("{}/{}?range=1d&interval=1d", CHART_URL, encode(symbol));
        let data: YahooChartResponse = self.get_json(&url, None).await?;
        let chart = data.chart;
        match chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(result.meta),
            None => Err(match chart.error {
                Some(e) if e.code.as_deref() != Some("Not Found") => {
                    MarketDataError::provider(PROVIDER_ID, e.message())
                }
                _ => MarketDataError::SymbolNotFound(symbol.to_string()),
            }),
        }
    }

    async fn timeseries(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Vec<Map<String, Value>>, MarketDataError> {
        let end = Utc::now();
        let start = lookback_start(end, 366 * i64::from(self.statement_years));
        let url = format!(
            "{}/{}?symbol={}&type={}&period1={}&period2={}",
            TIMESERIES_URL,
            encode(symbol),
            encode(symbol),
            statements::timeseries_types(kind, frequency),
            start.timestamp(),
            end.timestamp()
        );

        let data: YahooTimeseriesResponse = self.get_json(&url, None).await?;
        match (data.timeseries.result, data.timeseries.error) {
            (Some(results), _) => Ok(results),
            (None, Some(e)) => Err(MarketDataError::provider(PROVIDER_ID, e.message())),
            (None, None) => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Chart data
    // ========================================================================

    /// Convert chrono DateTime<Utc> to time::OffsetDateTime for the Yahoo API.
    fn chrono_to_offset_datetime(dt: DateTime<Utc>) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(dt.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    async fn chart(
        &self,
        symbol: &str,
        window: &HistoryWindow,
        interval: &str,
    ) -> Result<yahoo::YResponse, MarketDataError> {
        let now = Utc::now();
        let result = match window {
            HistoryWindow::Period(period) => {
                self.connector
                    .get_quote_range(symbol, interval, period)
                    .await
            }
            HistoryWindow::Start(date) => {
                let start = date.and_time(NaiveTime::MIN).and_utc();
                self.connector
                    .get_quote_history_interval(
                        symbol,
                        Self::chrono_to_offset_datetime(start),
                        Self::chrono_to_offset_datetime(now),
                        interval,
                    )
                    .await
            }
            HistoryWindow::LastDays(days) => {
                let start = lookback_start(now, i64::from(*days));
                self.connector
                    .get_quote_history_interval(
                        symbol,
                        Self::chrono_to_offset_datetime(start),
                        Self::chrono_to_offset_datetime(now),
                        interval,
                    )
                    .await
            }
        };

        result.map_err(|e| {
            if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
                MarketDataError::SymbolNotFound(symbol.to_string())
            } else {
                MarketDataError::provider(PROVIDER_ID, e.to_string())
            }
        })
    }
}

/// Earliest instant a lookback window may start at.
fn earliest_start() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// `days` before `now`, clamped to [`earliest_start`].
fn lookback_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let floor = earliest_start();
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .map_or(floor, |start| start.max(floor))
}

fn unavailable(message: String) -> MarketDataError {
    MarketDataError::ProviderUnavailable {
        provider: PROVIDER_ID.to_string(),
        message,
    }
}

fn dividend_events(response: &yahoo::YResponse) -> Vec<ActionEvent> {
    response
        .dividends()
        .unwrap_or_default()
        .into_iter()
        .map(|d| ActionEvent {
            timestamp: d.date as i64,
            value: d.amount,
        })
        .collect()
}

fn split_events(response: &yahoo::YResponse) -> Vec<ActionEvent> {
    response
        .splits()
        .unwrap_or_default()
        .into_iter()
        .filter(|s| s.denominator as f64 != 0.0)
        .map(|s| ActionEvent {
            timestamp: s.date as i64,
            value: s.numerator as f64 / s.denominator as f64,
        })
        .collect()
}

#[async_trait]
impl TickerDataSource for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn info(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        debug!("Fetching info for {} from Yahoo", symbol);

        match self.quote_summary(symbol, INFO_MODULES).await {
            Ok(result) => Ok(convert::flatten_modules(&result, INFO_MODULES)),
            Err(e) => {
                debug!(
                    "quoteSummary info failed for {}: {}, falling back to chart metadata",
                    symbol, e
                );
                let meta = self.chart_meta(symbol).await?;
                Ok(convert::chart_info(&meta))
            }
        }
    }

    async fn history(
        &self,
        symbol: &str,
        query: &HistoryQuery,
    ) -> Result<Option<Table>, MarketDataError> {
        debug!(
            "Fetching history for {} ({}, interval {}) from Yahoo",
            symbol, query.window, query.interval
        );

        let response = self.chart(symbol, &query.window, &query.interval).await?;
        let bars: Vec<Bar> = match response.quotes() {
            Ok(quotes) => quotes.into_iter().map(Bar::from).collect(),
            Err(yahoo::YahooError::NoQuotes) => {
                warn!("No quotes returned for '{}' ({})", symbol, query.window);
                Vec::new()
            }
            Err(e) => return Err(MarketDataError::provider(PROVIDER_ID, e.to_string())),
        };

        let (dividends, splits) = if query.actions {
            (dividend_events(&response), split_events(&response))
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Some(history::history_table(
            &bars,
            &dividends,
            &splits,
            query.actions,
        )))
    }

    async fn fast_info(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        let meta = self.chart_meta(symbol).await?;
        Ok(convert::fast_info(&meta))
    }

    async fn dividends(&self, symbol: &str) -> Result<Option<ProviderValue>, MarketDataError> {
        let window = HistoryWindow::Period("max".to_string());
        let response = self.chart(symbol, &window, "1d").await?;
        let series = history::dividend_series(&dividend_events(&response));
        Ok(Some(ProviderValue::Series(series)))
    }

    async fn statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Option<Table>, MarketDataError> {
        let results = self.timeseries(symbol, kind, frequency).await?;
        Ok(Some(statements::statement_table(kind, frequency, &results)))
    }

    async fn recommendations(&self, symbol: &str) -> Result<Option<Table>, MarketDataError> {
        let module = self.quote_summary_module(symbol, "recommendationTrend").await?;
        Ok(module.as_ref().map(convert::recommendations_table))
    }

    async fn institutional_holders(
        &self,
        symbol: &str,
    ) -> Result<Option<Table>, MarketDataError> {
        let module = self.quote_summary_module(symbol, "institutionOwnership").await?;
        Ok(module.as_ref().map(convert::institutional_holders_table))
    }

    async fn major_holders(&self, symbol: &str) -> Result<Option<Table>, MarketDataError> {
        let module = self.quote_summary_module(symbol, "majorHoldersBreakdown").await?;
        Ok(module.as_ref().map(convert::major_holders_table))
    }

    async fn calendar(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        let module = self.quote_summary_module(symbol, "calendarEvents").await?;
        Ok(module
            .as_ref()
            .map(convert::calendar_map)
            .unwrap_or(ProviderValue::Null))
    }
}
