use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::errors::MarketDataError;

use super::request::RequestError;

/// Failure classes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// The request was unusable; no provider call was made.
    InvalidInput,
    /// The provider could not be loaded.
    DependencyMissing,
    /// Anything that went wrong while fetching or assembling the payload.
    RuntimeError,
}

impl From<&MarketDataError> for FailureCode {
    fn from(error: &MarketDataError) -> Self {
        if error.is_unavailable() {
            Self::DependencyMissing
        } else {
            Self::RuntimeError
        }
    }
}

/// The single object written to stdout.
///
/// Outcome is carried by `ok`; the process exit status is always zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response<P = Value> {
    Success {
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<&'static str>,
        payload: P,
    },
    Failure {
        ok: bool,
        code: FailureCode,
        error: String,
    },
}

impl<P> Response<P> {
    pub fn success(payload: P) -> Self {
        Self::Success {
            ok: true,
            source: None,
            payload,
        }
    }

    /// A success response tagged with the data source it came from.
    pub fn sourced(source: &'static str, payload: P) -> Self {
        Self::Success {
            ok: true,
            source: Some(source),
            payload,
        }
    }

    pub fn failure(code: FailureCode, error: impl Into<String>) -> Self {
        Self::Failure {
            ok: false,
            code,
            error: error.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl<P> From<RequestError> for Response<P> {
    fn from(error: RequestError) -> Self {
        Self::failure(FailureCode::InvalidInput, error.to_string())
    }
}

impl<P> From<MarketDataError> for Response<P> {
    fn from(error: MarketDataError) -> Self {
        Self::failure(FailureCode::from(&error), error.to_string())
    }
}

/// Errors from writing the response itself.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),
}

/// Serialize `response` as strict JSON and write it to `writer`.
///
/// A payload that cannot be encoded (a non-finite float slipped past the
/// normalizer, for instance) is replaced with a `runtime_error` response
/// describing the encoding failure, so the host always receives an object.
pub fn write_response<W, P>(mut writer: W, response: &Response<P>) -> Result<(), ResponseError>
where
    W: Write,
    P: Serialize,
{
    let body = match serde_json::to_vec(response) {
        Ok(body) => body,
        Err(e) => {
            error!("Response could not be encoded as strict JSON: {}", e);
            let fallback: Response = Response::failure(
                FailureCode::RuntimeError,
                ResponseError::Encode(e).to_string(),
            );
            serde_json::to_vec(&fallback)?
        }
    };
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::strict;
    use serde_json::json;

    #[derive(Serialize)]
    struct Quote {
        #[serde(serialize_with = "strict::finite_option")]
        price: Option<f64>,
    }

    fn written<P: Serialize>(response: &Response<P>) -> String {
        let mut out = Vec::new();
        write_response(&mut out, response).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_invalid_input_is_exact() {
        let response: Response = RequestError::MissingTicker.into();
        assert_eq!(
            written(&response),
            r#"{"ok":false,"code":"invalid_input","error":"ticker is required"}"#
        );
    }

    #[test]
    fn test_success_field_order() {
        let response = Response::sourced("yfinance", json!({"ticker": "ACME"}));
        assert_eq!(
            written(&response),
            r#"{"ok":true,"source":"yfinance","payload":{"ticker":"ACME"}}"#
        );
        let response = Response::success(json!({}));
        assert_eq!(written(&response), r#"{"ok":true,"payload":{}}"#);
    }

    #[test]
    fn test_unavailable_provider_maps_to_dependency_missing() {
        let response: Response = MarketDataError::ProviderUnavailable {
            provider: "yahoo".to_string(),
            message: "no tls".to_string(),
        }
        .into();
        let Response::Failure { code, .. } = response else {
            panic!("expected failure");
        };
        assert_eq!(code, FailureCode::DependencyMissing);

        let response: Response = MarketDataError::SymbolNotFound("ZZZZ".to_string()).into();
        assert!(matches!(
            response,
            Response::Failure {
                code: FailureCode::RuntimeError,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_payload_fails_loudly() {
        let response = Response::success(Quote {
            price: Some(f64::NAN),
        });
        let parsed: Value = serde_json::from_str(&written(&response)).unwrap();
        assert_eq!(parsed["ok"], json!(false));
        assert_eq!(parsed["code"], json!("runtime_error"));
        assert!(parsed["error"]
            .as_str()
            .unwrap()
            .starts_with("failed to encode response"));
    }

    #[test]
    fn test_unicode_is_written_unescaped() {
        let response = Response::success(json!({"name": "Nestlé"}));
        assert!(written(&response).contains("Nestlé"));
    }
}
