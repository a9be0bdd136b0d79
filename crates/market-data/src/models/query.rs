use std::fmt;

use chrono::NaiveDate;

/// Default bar interval for history requests.
pub const DEFAULT_INTERVAL: &str = "1d";

/// Period used when neither a start date nor a period was requested.
pub const DEFAULT_PERIOD: &str = "max";

/// Which slice of history to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryWindow {
    /// From an explicit start date up to now.
    Start(NaiveDate),
    /// A provider period token such as `5y`, `ytd` or `max`.
    Period(String),
    /// The most recent `n` calendar days.
    LastDays(u32),
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(date) => write!(f, "start={}", date.format("%Y-%m-%d")),
            Self::Period(period) => write!(f, "period={period}"),
            Self::LastDays(days) => write!(f, "period={days}d"),
        }
    }
}

/// Parameters for a price history fetch.
///
/// History is always unadjusted: `Close` is the raw close and `Adj Close`
/// is carried as a separate column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryQuery {
    pub window: HistoryWindow,
    pub interval: String,
    /// Include `Dividends` and `Stock Splits` columns.
    pub actions: bool,
}

impl HistoryQuery {
    pub fn new(window: HistoryWindow, interval: impl Into<String>) -> Self {
        Self {
            window,
            interval: interval.into(),
            actions: true,
        }
    }

    /// Daily bars covering the last `days` days.
    pub fn last_days(days: u32) -> Self {
        Self::new(HistoryWindow::LastDays(days.max(1)), DEFAULT_INTERVAL)
    }
}

/// Financial statement families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

/// Reporting frequency of a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frequency {
    Annual,
    Quarterly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }
}
