//! Error types for the Horizon client core.
//!
//! # Design
//! A remote-reported failure (`Error::Api`) is kept apart from a body that
//! could not be decoded (`Error::Decode`) so callers can branch on the
//! problem type or status without inspecting transport details. `ApiError`
//! owns the original response; nothing in the core keeps a reference to it.

use std::fmt;

use thiserror::Error;

use crate::http::HttpResponse;
use crate::types::{Problem, ResultCodes};

/// Which body the decoder was reading when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    Payload,
    Problem,
}

impl fmt::Display for DecodeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStep::Payload => write!(f, "success payload"),
            DecodeStep::Problem => write!(f, "problem payload"),
        }
    }
}

/// Errors returned by the decoder and the client facade.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-2xx status and a problem document.
    #[error(transparent)]
    Api(Box<ApiError>),

    /// A response body could not be decoded into the expected shape.
    #[error("error decoding {step}: {source}")]
    Decode {
        step: DecodeStep,
        #[source]
        source: serde_json::Error,
    },

    /// The request was rejected before being built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// The API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.as_api().is_some_and(ApiError::is_not_found)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(Box::new(err))
    }
}

/// A non-success response together with its decoded problem document.
#[derive(Debug, Clone)]
pub struct ApiError {
    response: HttpResponse,
    problem: Problem,
}

impl ApiError {
    pub fn new(response: HttpResponse, problem: Problem) -> Self {
        Self { response, problem }
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// HTTP status of the response (not the one claimed by the problem body).
    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn is_not_found(&self) -> bool {
        self.response.status == 404 || self.problem.kind() == "not_found"
    }

    pub fn result_codes(&self) -> Option<ResultCodes> {
        self.problem.result_codes()
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "horizon error: {:?}", self.problem.title)?;
        if let Some(codes) = self.result_codes() {
            write!(f, " (transaction: {}", codes.transaction)?;
            if !codes.operations.is_empty() {
                write!(f, ", operations: {}", codes.operations.join(", "))?;
            }
            write!(f, ")")?;
        }
        write!(f, " - status {}", self.response.status)
    }
}

impl std::error::Error for ApiError {}
