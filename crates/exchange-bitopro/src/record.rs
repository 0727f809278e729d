//! Request/response capture for diagnostics.
//!
//! Every API call yields an [`ExchangeRecord`] whether it succeeded or not, so
//! test cases can attach exactly what was sent and what came back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// `None` when no response arrived (connection failure, timeout).
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
    /// Final URL after redirects.
    pub url: Option<String>,
    pub body: Option<Value>,
    /// Transport or decoding failure, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

impl RequestRecord {
    #[must_use]
    pub fn get(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            params,
            headers: BTreeMap::new(),
        }
    }
}

impl ExchangeRecord {
    #[must_use]
    pub fn new(request: RequestRecord) -> Self {
        Self {
            request,
            response: ResponseRecord::default(),
        }
    }

    /// Pretty JSON for attaching to a case result.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Copies response headers into a sorted string map, dropping non-UTF-8 values.
pub(crate) fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
