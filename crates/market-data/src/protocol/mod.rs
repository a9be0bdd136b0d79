//! Request/response contract with the host process.
//!
//! One JSON object comes in on stdin, one JSON object goes out on stdout.

mod request;
mod response;
pub mod strict;

pub use request::{
    integer_field, parse_request, read_request, string_field, ticker_field, RequestArgs,
    RequestError,
};
pub use response::{write_response, FailureCode, Response, ResponseError};
