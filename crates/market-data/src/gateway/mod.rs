//! The two fetch pipelines: request args in, [`Response`] out.
//!
//! Both are written against [`TickerDataSource`] and take a `connect`
//! closure so the request is validated before any provider is built.
//!
//! [`Response`]: crate::protocol::Response
//! [`TickerDataSource`]: crate::provider::TickerDataSource

mod history;
mod snapshot;

use chrono::{SecondsFormat, Utc};

pub use history::{
    fetch_price_history, index_to_utc_date, price_history, rows_from_table, to_number,
    HistoryPayload, PriceHistoryRequest, PriceRow,
};
pub use snapshot::{
    fetch_snapshot, snapshot, SnapshotPayload, SnapshotRequest, DEFAULT_HISTORY_DAYS,
    SNAPSHOT_SOURCE,
};

/// Current UTC instant, e.g. `2024-05-01T12:00:00.123456+00:00`.
pub fn fetched_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
