//! Query string encoding for Horizon-style list endpoints.
//!
//! # Design
//! `QueryParam` is a closed enum, so every kind the encoder can receive is
//! matched exhaustively at compile time and an unrecognized kind cannot be
//! constructed. Each kind has an "empty" sentinel (empty string, zero limit,
//! `false` flag, `Order::Unspecified`) that is never serialized.
//!
//! Both `encode_query` and `count_present` go through `QueryParam::pairs`,
//! so request validation and encoding always agree on what is present.
//!
//! Keys and values are escaped like a form query: only `A-Za-z0-9-_.~` pass
//! through unchanged and a space becomes `+`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

/// Everything except the unreserved characters `-`, `_`, `.` and `~`.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Sort direction of a list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Unspecified => "",
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// A single typed query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryParam {
    Cursor(String),
    Order(Order),
    Limit(u32),
    AssetCode(String),
    AssetIssuer(String),
    IncludeFailed(bool),
    /// Endpoint-specific parameters, emitted under their own keys.
    Extra(BTreeMap<String, String>),
}

impl QueryParam {
    pub fn cursor(cursor: impl Into<String>) -> Self {
        QueryParam::Cursor(cursor.into())
    }

    pub fn asset_code(code: impl Into<String>) -> Self {
        QueryParam::AssetCode(code.into())
    }

    pub fn asset_issuer(issuer: impl Into<String>) -> Self {
        QueryParam::AssetIssuer(issuer.into())
    }

    pub fn extra<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        QueryParam::Extra(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Key/value pairs this parameter contributes to the query string.
    /// Empty when the parameter holds its empty sentinel.
    fn pairs(&self) -> Vec<(&str, Cow<'_, str>)> {
        match self {
            QueryParam::Cursor(cursor) if !cursor.is_empty() => {
                vec![("cursor", Cow::Borrowed(cursor.as_str()))]
            }
            QueryParam::Order(order) if *order != Order::Unspecified => {
                vec![("order", Cow::Borrowed(order.as_str()))]
            }
            QueryParam::Limit(limit) if *limit != 0 => {
                vec![("limit", Cow::Owned(limit.to_string()))]
            }
            QueryParam::AssetCode(code) if !code.is_empty() => {
                vec![("asset_code", Cow::Borrowed(code.as_str()))]
            }
            QueryParam::AssetIssuer(issuer) if !issuer.is_empty() => {
                vec![("asset_issuer", Cow::Borrowed(issuer.as_str()))]
            }
            QueryParam::IncludeFailed(true) => vec![("include_failed", Cow::Borrowed("true"))],
            QueryParam::Extra(entries) => entries
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.as_str(), Cow::Borrowed(value.as_str())))
                .collect(),
            QueryParam::Cursor(_)
            | QueryParam::Order(_)
            | QueryParam::Limit(_)
            | QueryParam::AssetCode(_)
            | QueryParam::AssetIssuer(_)
            | QueryParam::IncludeFailed(false) => Vec::new(),
        }
    }

    /// Whether this parameter would contribute anything to an encoded query.
    ///
    /// An `Extra` map is present when at least one of its values is non-empty.
    pub fn is_present(&self) -> bool {
        !self.pairs().is_empty()
    }
}

/// Encode `params` as a URL query string (without the leading `?`).
///
/// Keys are sorted; repeated keys keep the order they were supplied in.
pub fn encode_query(params: &[QueryParam]) -> String {
    let mut query: BTreeMap<&str, Vec<Cow<'_, str>>> = BTreeMap::new();
    for param in params {
        for (key, value) in param.pairs() {
            query.entry(key).or_default().push(value);
        }
    }

    let mut encoded = String::new();
    for (key, values) in &query {
        for value in values {
            if !encoded.is_empty() {
                encoded.push('&');
            }
            encoded.push_str(&escape(key));
            encoded.push('=');
            encoded.push_str(&escape(value));
        }
    }
    encoded
}

// A literal `%` is itself escaped to `%25`, so `%20` can only come from a space.
fn escape(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_ESCAPE)
        .to_string()
        .replace("%20", "+")
}

/// Number of parameters in `params` that are present, by the same rule
/// `encode_query` uses to decide what to emit.
pub fn count_present(params: &[QueryParam]) -> usize {
    params.iter().filter(|param| param.is_present()).count()
}
