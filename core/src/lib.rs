//! Request/response translation layer for a Horizon-style REST API.
//!
//! # Overview
//! Encodes typed query parameters into query strings and decodes
//! `HttpResponse` values into payloads or structured API errors, without
//! touching the network (host-does-IO pattern). Each decoded response also
//! refreshes a per-host estimate of the server's clock.
//!
//! # Design
//! - `query` is pure: a closed `QueryParam` enum, `encode_query` and
//!   `count_present` sharing one emptiness rule.
//! - `server_time::ServerTimeTracker` is an owned, injectable value rather
//!   than process-wide state.
//! - `decode::decode_response` consumes the response and returns either a
//!   fully decoded value, an `ApiError` with its problem, or a decode error.
//! - `HorizonClient` ties the three to a base URL.

pub mod client;
pub mod decode;
pub mod error;
pub mod http;
pub mod query;
pub mod server_time;
pub mod types;

pub use client::HorizonClient;
pub use decode::decode_response;
pub use error::{ApiError, DecodeStep, Error};
pub use http::{host_identity, HttpMethod, HttpRequest, HttpResponse};
pub use query::{count_present, encode_query, Order, QueryParam};
pub use server_time::{
    Clock, ManualClock, ServerTimeRecord, ServerTimeTracker, SystemClock, DEFAULT_STALENESS,
};
pub use types::{Page, Problem, ResultCodes};
