#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tickerpipe_market_data::models::{Frequency, HistoryQuery, StatementKind};
use tickerpipe_market_data::{MarketDataError, ProviderValue, Table, TickerDataSource};

/// In-memory data source. `None` in `info`/`history` makes that call fail.
pub struct StubSource {
    pub info: Option<ProviderValue>,
    pub history: Option<Table>,
    /// Returned for every statement request.
    pub statements: Option<Table>,
    /// History queries received, shared so tests can inspect them after
    /// the source is moved into a pipeline.
    pub queries: Arc<Mutex<Vec<HistoryQuery>>>,
}

impl StubSource {
    pub fn new(history: Table) -> Self {
        Self {
            info: Some(ProviderValue::map([
                ("currency", ProviderValue::str("USD")),
                ("longName", ProviderValue::str("Acme Corp")),
            ])),
            history: Some(history),
            statements: None,
            queries: Arc::default(),
        }
    }
}

#[async_trait]
impl TickerDataSource for StubSource {
    fn id(&self) -> &'static str {
        "STUB"
    }

    async fn info(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        self.info
            .clone()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }

    async fn history(
        &self,
        symbol: &str,
        query: &HistoryQuery,
    ) -> Result<Option<Table>, MarketDataError> {
        self.queries.lock().unwrap().push(query.clone());
        match &self.history {
            Some(table) => Ok(Some(table.clone())),
            None => Err(MarketDataError::provider("STUB", format!("no history for {symbol}"))),
        }
    }

    async fn statement(
        &self,
        _symbol: &str,
        _kind: StatementKind,
        _frequency: Frequency,
    ) -> Result<Option<Table>, MarketDataError> {
        Ok(self.statements.clone())
    }
}

/// A daily history table with `days` rows starting 2024-01-02 14:30 UTC.
pub fn daily_history(days: i64) -> Table {
    let mut table = Table::with_columns([
        "Open",
        "High",
        "Low",
        "Close",
        "Adj Close",
        "Volume",
        "Dividends",
        "Stock Splits",
    ]);
    for day in 0..days {
        let stamp = DateTime::from_timestamp(1_704_205_800 + day * 86_400, 0)
            .unwrap()
            .fixed_offset();
        let close = 100.0 + day as f64;
        table.push_row(
            ProviderValue::ZonedDateTime(stamp),
            vec![
                ProviderValue::Float(close - 1.0),
                ProviderValue::Float(close + 1.0),
                ProviderValue::Float(close - 2.0),
                ProviderValue::Float(close),
                ProviderValue::Float(close - 0.5),
                ProviderValue::Int(1_000_000),
                ProviderValue::Float(0.0),
                ProviderValue::Float(0.0),
            ],
        );
    }
    table
}

pub fn parse(out: &[u8]) -> Value {
    serde_json::from_slice(out).expect("response is valid JSON")
}
