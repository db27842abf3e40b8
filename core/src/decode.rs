//! Turns a completed `HttpResponse` into a decoded value or an `Error`.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, DecodeStep, Error};
use crate::http::HttpResponse;
use crate::server_time::ServerTimeTracker;
use crate::types::Problem;

/// Decode `response` into `T`, or into an API error for non-2xx statuses.
///
/// The `Date` header is recorded in `server_time` before the status is
/// looked at, so error responses also refresh the clock estimate. A missing
/// host or a missing or malformed `Date` header only skips that update.
///
/// The response is consumed: on success and on decode failure its body is
/// dropped here, on an API error it moves into the returned `ApiError`.
pub fn decode_response<T>(
    response: HttpResponse,
    server_time: &ServerTimeTracker,
) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    record_server_time(&response, server_time);

    if !response.is_success() {
        let problem: Problem =
            serde_json::from_str(&response.body).map_err(|source| Error::Decode {
                step: DecodeStep::Problem,
                source,
            })?;
        log::debug!(
            "horizon responded {} ({}): {}",
            response.status,
            problem.kind(),
            problem.title
        );
        return Err(ApiError::new(response, problem).into());
    }

    serde_json::from_str(&response.body).map_err(|source| Error::Decode {
        step: DecodeStep::Payload,
        source,
    })
}

fn record_server_time(response: &HttpResponse, server_time: &ServerTimeTracker) {
    let Some(host) = response.host.as_deref() else {
        return;
    };
    match response.header("date") {
        Some(date) => server_time.record(host, date),
        None => log::debug!("no Date header in response from {host}"),
    }
}
