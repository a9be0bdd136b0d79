//! Market data source trait definitions.
//!
//! This module defines the `TickerDataSource` trait the fetch pipelines are
//! written against.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Frequency, HistoryQuery, ProviderValue, StatementKind, Table};

/// Trait for per-ticker market data sources.
///
/// Every method hands back provider data already converted into the closed
/// [`ProviderValue`]/[`Table`] model. `Ok(None)` means the provider has no
/// such dataset for the symbol; an empty table means it has one with no rows.
///
/// Only [`info`](Self::info) and [`history`](Self::history) are mandatory.
/// The remaining datasets default to `NotSupported`, which the snapshot
/// pipeline reports as `null`.
#[async_trait]
pub trait TickerDataSource: Send + Sync {
    /// Unique identifier for this source, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Ticker metadata as a flat map.
    async fn info(&self, symbol: &str) -> Result<ProviderValue, MarketDataError>;

    /// OHLCV history with `Open`, `High`, `Low`, `Close`, `Adj Close` and
    /// `Volume` columns, plus `Dividends` and `Stock Splits` when
    /// `query.actions` is set. The index holds bar timestamps.
    async fn history(
        &self,
        symbol: &str,
        query: &HistoryQuery,
    ) -> Result<Option<Table>, MarketDataError>;

    /// Quick quote snapshot (last price, day range, currency, ...).
    async fn fast_info(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "fast_info"))
    }

    /// Dividend series keyed by payment timestamp.
    async fn dividends(&self, symbol: &str) -> Result<Option<ProviderValue>, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "dividends"))
    }

    /// A financial statement with line items as the index and period end
    /// dates as columns, newest first.
    async fn statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Option<Table>, MarketDataError> {
        let _ = (symbol, kind, frequency);
        Err(not_supported(self.id(), "statement"))
    }

    /// Analyst recommendation trend.
    async fn recommendations(&self, symbol: &str) -> Result<Option<Table>, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "recommendations"))
    }

    /// Largest institutional holders.
    async fn institutional_holders(
        &self,
        symbol: &str,
    ) -> Result<Option<Table>, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "institutional_holders"))
    }

    /// Ownership breakdown (insiders, institutions).
    async fn major_holders(&self, symbol: &str) -> Result<Option<Table>, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "major_holders"))
    }

    /// Upcoming events (earnings, dividend dates). Arbitrary shape.
    async fn calendar(&self, symbol: &str) -> Result<ProviderValue, MarketDataError> {
        let _ = symbol;
        Err(not_supported(self.id(), "calendar"))
    }
}

fn not_supported(provider: &str, operation: &str) -> MarketDataError {
    MarketDataError::NotSupported {
        operation: operation.to_string(),
        provider: provider.to_string(),
    }
}
