//! Market data models
//!
//! This module contains the core data types exchanged with providers:
//! - `value` - The closed `ProviderValue` model every provider response is converted into
//! - `table` - Tabular (`Table`) and time-indexed (`Series`) provider values
//! - `query` - History windows, statement kinds and reporting frequencies

mod query;
mod table;
mod value;

pub use query::{
    Frequency, HistoryQuery, HistoryWindow, StatementKind, DEFAULT_INTERVAL, DEFAULT_PERIOD,
};
pub use table::{Row, Series, SplitTable, Table};
pub use value::{ProviderValue, Wrapped};
