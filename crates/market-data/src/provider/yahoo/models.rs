//! Yahoo Finance API response models.
//!
//! Only the envelopes are typed. Module bodies (quoteSummary) and timeseries
//! entries have open-ended keys and stay as `serde_json` values until they
//! are converted into [`ProviderValue`](crate::models::ProviderValue)s.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Main response wrapper for quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

/// Quote summary container; `result` is null when the symbol is unknown.
#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    pub result: Option<Vec<Map<String, Value>>>,
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl YahooApiError {
    pub fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(code), None) => code.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// v8 chart response, read for its `meta` block only.
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    pub result: Option<Vec<YahooChartResult>>,
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    pub meta: YahooChartMeta,
}

/// Instrument metadata attached to every chart response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub exchange_name: Option<String>,
    pub full_exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub exchange_timezone_name: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub regular_market_time: Option<i64>,
}

/// Fundamentals timeseries response.
#[derive(Debug, Deserialize)]
pub struct YahooTimeseriesResponse {
    pub timeseries: YahooTimeseries,
}

#[derive(Debug, Deserialize)]
pub struct YahooTimeseries {
    #[serde(default)]
    pub result: Option<Vec<Map<String, Value>>>,
    pub error: Option<YahooApiError>,
}

/// One reported value of a fundamentals line item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooTimeseriesPoint {
    pub as_of_date: String,
    pub reported_value: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_quote_summary_without_result() {
        let json = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}}}"#;
        let response: YahooQuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert!(response.quote_summary.result.is_none());
        assert_eq!(
            response.quote_summary.error.unwrap().message(),
            "Not Found: Quote not found for symbol: ZZZZ"
        );
    }

    #[test]
    fn test_deserialize_chart_meta() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "USD",
                        "symbol": "AAPL",
                        "exchangeName": "NMS",
                        "instrumentType": "EQUITY",
                        "regularMarketPrice": 189.84,
                        "chartPreviousClose": 187.15,
                        "fiftyTwoWeekHigh": 199.62,
                        "gmtoffset": -14400
                    },
                    "timestamp": [1700000000],
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        }"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let meta = &response.chart.result.unwrap()[0].meta;
        assert_eq!(meta.currency.as_deref(), Some("USD"));
        assert_eq!(meta.instrument_type.as_deref(), Some("EQUITY"));
        assert_eq!(meta.regular_market_price, Some(189.84));
        assert_eq!(meta.previous_close, None);
    }

    #[test]
    fn test_deserialize_timeseries_point() {
        let json = r#"{"asOfDate": "2023-09-30", "periodType": "12M", "currencyCode": "USD",
                       "reportedValue": {"raw": 383285000000, "fmt": "383.29B"}}"#;
        let point: YahooTimeseriesPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.as_of_date, "2023-09-30");
        assert!(point.reported_value.is_some());
    }
}
