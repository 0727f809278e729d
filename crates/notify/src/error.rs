use thiserror::Error;

/// Errors raised while delivering a run summary.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The sink answered with an unexpected status.
    #[error("{sink} returned HTTP {status}: {body}")]
    Http {
        sink: &'static str,
        status: u16,
        body: String,
    },

    /// Connection failure, timeout or other transport problem.
    #[error("network error: {0}")]
    Network(String),

    /// Credentials could not be loaded or exchanged for a token.
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Missing or inconsistent sink settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl NotifyError {
    pub fn http(sink: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            sink,
            status,
            body: body.into(),
        }
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status, for errors that carry one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for NotifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message() {
        let err = NotifyError::http("slack", 404, "no_service");
        assert_eq!(err.to_string(), "slack returned HTTP 404: no_service");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(NotifyError::auth("bad key").status_code(), None);
    }
}
