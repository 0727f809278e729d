//! Chat webhook sink.

use crate::error::{NotifyError, Result};
use crate::sink::ResultSink;
use async_trait::async_trait;
use bito_qa_core::CaseReport;
use serde_json::json;
use std::time::Duration;

/// Posts `{"text": ...}` to an incoming-webhook URL, one message per report.
#[derive(Clone)]
pub struct SlackNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the webhook URL is a credential
        f.debug_struct("SlackNotifier").finish_non_exhaustive()
    }
}

impl SlackNotifier {
    /// # Errors
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            http,
        })
    }

    /// Sends one text message. Anything but HTTP 200 is an error.
    ///
    /// # Errors
    /// Returns [`NotifyError::Http`] with the response text on a non-200 status,
    /// or a network error if the webhook could not be reached.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::http("slack", status, body));
        }

        tracing::debug!("Slack message delivered");
        Ok(())
    }
}

#[async_trait]
impl ResultSink for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn deliver(&self, reports: &[CaseReport]) -> Result<()> {
        for report in reports {
            self.send_text(&report.chat_message()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bito_qa_core::CaseCounts;
    use chrono::Local;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report() -> CaseReport {
        let now = Local::now();
        CaseReport::new(
            "Production",
            "front_test_/ns/fees",
            CaseCounts {
                fail: 1,
                broken: 0,
                skip: 0,
                pass: 9,
                known: 0,
            },
            "http://localhost:8000/reports/fees/x.html",
            now,
            now,
        )
    }

    fn notifier(server: &MockServer) -> SlackNotifier {
        SlackNotifier::new(format!("{}/services/T0/B0/X0", server.uri()), Duration::from_secs(5))
            .expect("notifier")
    }

    #[tokio::test]
    async fn test_posts_chat_message() {
        let server = MockServer::start().await;
        let report = report();
        Mock::given(method("POST"))
            .and(path("/services/T0/B0/X0"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "text": report.chat_message() })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).deliver(&[report]).await.expect("delivered");
    }

    #[tokio::test]
    async fn test_non_200_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid_token"))
            .mount(&server)
            .await;

        let err = notifier(&server)
            .send_text("hello")
            .await
            .expect_err("403");
        assert_eq!(err.status_code(), Some(403));
        assert!(err.to_string().contains("invalid_token"));
    }

    #[tokio::test]
    async fn test_other_success_codes_are_errors_too() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = notifier(&server).send_text("hello").await.expect_err("204");
        assert_eq!(err.status_code(), Some(204));
    }
}
