//! Price history fetcher.
//!
//! stdin:  `{"ticker": "AAPL", "start_date": "2020-01-01", "period": "5y", "interval": "1d"}`
//! stdout: `{"ok": true, "payload": {"ticker", "currency", "fetched_at", "rows"}}`
//! or a failure object. The exit status is always zero.

use std::io;
use std::process::ExitCode;

use tickerpipe_fetchers::{init_tracing, serve};
use tickerpipe_market_data::gateway::fetch_price_history;
use tickerpipe_market_data::{Config, YahooProvider};

fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(config.log_format);

    let result = serve(io::stdin().lock(), io::stdout().lock(), |args| async move {
        fetch_price_history(&args, || YahooProvider::new(&config)).await
    });
    if let Err(e) = result {
        tracing::error!("price-history: {:#}", e);
    }
    ExitCode::SUCCESS
}
