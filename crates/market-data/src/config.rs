//! Environment-driven configuration.

use std::time::Duration;

use tracing::warn;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATEMENT_YEARS: u32 = 5;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Log output flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Timeout applied to every provider HTTP call.
    pub http_timeout: Duration,
    pub user_agent: String,
    pub log_format: LogFormat,
    /// How far back fundamentals timeseries are requested.
    pub statement_years: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_format: LogFormat::Text,
            statement_years: DEFAULT_STATEMENT_YEARS,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        // A missing .env is the normal case
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let http_timeout = parse_or("TICKERPIPE_HTTP_TIMEOUT_SECS", &lookup)
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let statement_years = parse_or("TICKERPIPE_STATEMENT_YEARS", &lookup)
            .filter(|years: &u32| *years > 0)
            .unwrap_or(defaults.statement_years);

        let user_agent = lookup("TICKERPIPE_USER_AGENT")
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .unwrap_or(defaults.user_agent);

        let log_format = match lookup("TICKERPIPE_LOG_FORMAT") {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            http_timeout,
            user_agent,
            log_format,
            statement_years,
        }
    }
}

fn parse_or<T, F>(key: &str, lookup: &F) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
