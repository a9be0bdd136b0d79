//! Ticker snapshot fetcher.
//!
//! stdin:  `{"ticker": "AAPL", "history_days": 30}`
//! stdout: `{"ok": true, "source": "yfinance", "payload": {...}}` or a failure
//! object. The exit status is always zero.

use std::io;
use std::process::ExitCode;

use tickerpipe_fetchers::{init_tracing, serve};
use tickerpipe_market_data::gateway::fetch_snapshot;
use tickerpipe_market_data::{Config, YahooProvider};

fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(config.log_format);

    let result = serve(io::stdin().lock(), io::stdout().lock(), |args| async move {
        fetch_snapshot(&args, || YahooProvider::new(&config)).await
    });
    if let Err(e) = result {
        tracing::error!("ticker-snapshot: {:#}", e);
    }
    ExitCode::SUCCESS
}
