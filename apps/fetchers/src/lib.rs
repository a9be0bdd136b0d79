//! Shared driver for the stdin/stdout fetcher binaries.

use std::any::Any;
use std::future::Future;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use anyhow::Context;
use serde::Serialize;
use tickerpipe_market_data::protocol::{
    read_request, write_response, FailureCode, RequestArgs, Response,
};
use tickerpipe_market_data::LogFormat;
use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logs go to stderr; stdout is reserved for
/// the response object.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Read one request from `input`, run `pipeline` on it and write the
/// response to `output`.
///
/// Every outcome of the pipeline, including a runtime that cannot start or
/// a panic inside the pipeline, becomes a response object. Only a failure to write that object is
/// returned as an error.
pub fn serve<R, W, P, F, Fut>(input: R, output: W, pipeline: F) -> anyhow::Result<()>
where
    R: Read,
    W: Write,
    P: Serialize,
    F: FnOnce(RequestArgs) -> Fut,
    Fut: Future<Output = Response<P>>,
{
    let args = read_request(input);

    let response = match build_runtime() {
        Ok(runtime) => {
            match panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(pipeline(args)))) {
                Ok(response) => response,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("pipeline panicked: {}", message);
                    Response::failure(
                        FailureCode::RuntimeError,
                        format!("internal error: {}", message),
                    )
                }
            }
        }
        Err(e) => {
            error!("{:#}", e);
            Response::failure(FailureCode::RuntimeError, format!("{:#}", e))
        }
    };

    write_response(output, &response).context("failed to write response to stdout")
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
