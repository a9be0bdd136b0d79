//! tickerpipe market data crate
//!
//! Fetches ticker data from a provider and turns it into strict JSON for a
//! host process talking over stdin/stdout.
//!
//! # Architecture
//!
//! ```text
//! stdin --> protocol::read_request --> gateway --> TickerDataSource (Yahoo)
//!                                         |
//!                                         v
//!                                  normalize (values, tables, series)
//!                                         |
//!                                         v
//! stdout <-- protocol::write_response <---+
//! ```
//!
//! # Core Types
//!
//! - [`ProviderValue`] - Closed model of everything a provider can return
//! - [`Table`] / [`Series`] - Tabular and time-indexed provider data
//! - [`TickerDataSource`] - The provider seam the pipelines are written against
//! - [`Response`] - The single object written back to the host

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod protocol;
pub mod provider;

pub use config::{Config, LogFormat};
pub use errors::{MarketDataError, TableError};
pub use models::{
    Frequency, HistoryQuery, HistoryWindow, ProviderValue, Series, StatementKind, Table, Wrapped,
};
pub use protocol::{read_request, write_response, FailureCode, RequestArgs, Response};
pub use provider::yahoo::YahooProvider;
pub use provider::TickerDataSource;
