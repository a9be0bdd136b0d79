//! Ticker data sources.
//!
//! The fetch pipelines only see the [`TickerDataSource`] trait; Yahoo is the
//! one concrete implementation.

mod traits;

pub mod yahoo;

pub use traits::TickerDataSource;
