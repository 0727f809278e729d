//! Error types for the BitoPro API client and fees page extractor.

use crate::record::ExchangeRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Placeholder used when an error response body could not be read at all.
pub const UNREADABLE_BODY: &str = "unable to read response body";

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
    Unavailable,
}

impl ErrorBody {
    /// Classifies raw response text: JSON if it parses, otherwise the text itself.
    #[must_use]
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    /// Body as a JSON value, for capture in an [`ExchangeRecord`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Unavailable => Value::String(UNREADABLE_BODY.to_string()),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Unavailable => f.write_str(UNREADABLE_BODY),
        }
    }
}

/// Errors that can occur when talking to BitoPro.
#[derive(Debug, Error)]
pub enum BitoProError {
    /// Non-2xx response from the API.
    #[error("API error: {status} - {body}")]
    Api {
        status: u16,
        body: ErrorBody,
        headers: BTreeMap<String, String>,
        record: Box<ExchangeRecord>,
    },

    /// Connection failure or other transport problem.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Response body was not the expected JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Fees page could not be fetched or read.
    #[error("fees page error: {0}")]
    Page(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BitoProError {
    /// Creates an API error from a status, body and the captured exchange.
    pub fn api(status: u16, body: ErrorBody, record: ExchangeRecord) -> Self {
        Self::Api {
            status,
            body,
            headers: record.response.headers.clone(),
            record: Box::new(record),
        }
    }

    /// HTTP status for API errors.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error body for API errors.
    #[must_use]
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Captured exchange for API errors.
    #[must_use]
    pub fn record(&self) -> Option<&ExchangeRecord> {
        match self {
            Self::Api { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Returns true if the failure is likely to go away on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BitoProError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BitoProError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for BitoPro operations.
pub type Result<T> = std::result::Result<T, BitoProError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_from_text_prefers_json() {
        let body = ErrorBody::from_text(r#"{"error":"invalid pair"}"#.to_string());
        assert_eq!(body, ErrorBody::Json(json!({"error": "invalid pair"})));

        let body = ErrorBody::from_text("Bad Gateway".to_string());
        assert_eq!(body, ErrorBody::Text("Bad Gateway".to_string()));
    }

    #[test]
    fn test_unavailable_body_renders_placeholder() {
        assert_eq!(ErrorBody::Unavailable.to_string(), UNREADABLE_BODY);
        assert_eq!(ErrorBody::Unavailable.to_value(), json!(UNREADABLE_BODY));
    }

    #[test]
    fn test_api_error_carries_status_and_headers() {
        let mut record = ExchangeRecord::default();
        record
            .response
            .headers
            .insert("x-request-id".to_string(), "abc".to_string());

        let err = BitoProError::api(400, ErrorBody::Text("bad".to_string()), record);

        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad"));
        match &err {
            BitoProError::Api { headers, .. } => {
                assert_eq!(headers.get("x-request-id").map(String::as_str), Some("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.record().is_some());
    }

    #[test]
    fn test_transient_classification() {
        assert!(BitoProError::Timeout("slow".to_string()).is_transient());
        assert!(BitoProError::Network("refused".to_string()).is_transient());
        assert!(BitoProError::api(503, ErrorBody::Unavailable, ExchangeRecord::default())
            .is_transient());
        assert!(!BitoProError::api(400, ErrorBody::Unavailable, ExchangeRecord::default())
            .is_transient());
        assert!(!BitoProError::Page("missing".to_string()).is_transient());
    }
}
