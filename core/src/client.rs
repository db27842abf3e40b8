//! Request builder and response parser bound to one Horizon server.
//!
//! # Design
//! `HorizonClient` holds a `base_url` and a shared `ServerTimeTracker`.
//! Building a request is pure; parsing a response only touches the tracker.
//! The caller executes the HTTP round-trip between `build_get` and `parse`,
//! so the core stays free of I/O dependencies.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::decode::decode_response;
use crate::error::Error;
use crate::http::{host_identity, HttpMethod, HttpRequest, HttpResponse};
use crate::query::{count_present, encode_query, QueryParam};
use crate::server_time::ServerTimeTracker;

#[derive(Debug, Clone)]
pub struct HorizonClient {
    base_url: String,
    host: Option<String>,
    server_time: Arc<ServerTimeTracker>,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_server_time(base_url, Arc::new(ServerTimeTracker::new()))
    }

    /// Like `new`, but sharing `server_time` with other clients.
    pub fn with_server_time(base_url: &str, server_time: Arc<ServerTimeTracker>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let host = host_identity(&base_url);
        Self {
            base_url,
            host,
            server_time,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host identity of `base_url`, the key used for server time records.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn server_time(&self) -> &Arc<ServerTimeTracker> {
        &self.server_time
    }

    /// Estimated current time on this client's server.
    pub fn current_server_time(&self) -> Option<i64> {
        self.server_time.current_server_time(self.host.as_deref()?)
    }

    /// Build a GET request for `path`, with `params` as its query string.
    pub fn build_get(&self, path: &str, params: &[QueryParam]) -> HttpRequest {
        let query = encode_query(params);
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        HttpRequest {
            method: HttpMethod::Get,
            path: url,
            headers: vec![("accept".to_string(), "application/hal+json".to_string())],
            body: None,
        }
    }

    /// Reject `params` when more than one of them is present.
    ///
    /// `group` names the mutually exclusive filters in the error message.
    pub fn ensure_exclusive(group: &str, params: &[QueryParam]) -> Result<(), Error> {
        let present = count_present(params);
        if present > 1 {
            return Err(Error::InvalidRequest(format!(
                "at most one of {group} may be set, got {present}"
            )));
        }
        Ok(())
    }

    /// Decode a response to a request built by this client.
    ///
    /// Fills in `response.host` from `base_url` when the caller left it empty.
    pub fn parse<T: DeserializeOwned>(&self, mut response: HttpResponse) -> Result<T, Error> {
        if response.host.is_none() {
            response.host = self.host.clone();
        }
        decode_response(response, &self.server_time)
    }
}
