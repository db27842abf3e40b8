//! Response DTOs shared by every Horizon endpoint.
//!
//! # Design
//! Only the envelope shapes live here: the problem document returned with
//! every non-2xx response, and the HAL page wrapping list results. Resource
//! records are decoded into caller-supplied types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treat an explicit JSON `null` like a missing member.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Problem document (RFC 7807 style) describing a failed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub type_: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

impl Problem {
    /// Final path segment of the problem type,
    /// e.g. `not_found` for `https://stellar.org/horizon-errors/not_found`.
    pub fn kind(&self) -> &str {
        self.type_
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.as_ref()?.get(key)
    }

    /// String-valued extra, such as `envelope_xdr` or `result_xdr`.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key)?.as_str()
    }

    /// Transaction and operation result codes from a failed submission.
    ///
    /// `None` when the problem carries no `result_codes` extra or it does
    /// not have the expected shape.
    pub fn result_codes(&self) -> Option<ResultCodes> {
        let codes = self.extra("result_codes")?;
        ResultCodes::deserialize(codes).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultCodes {
    #[serde(deserialize_with = "null_as_default")]
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_transaction: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub operations: Vec<String>,
}

/// HAL page of records, as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<T>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedded<T> {
    pub records: Vec<T>,
}

impl<T> Page<T> {
    pub fn records(&self) -> &[T] {
        &self.embedded.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.embedded.records
    }
}
