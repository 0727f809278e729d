//! Delivery fan-out over every configured sink.

use crate::error::Result;
use crate::sheets::SheetsNotifier;
use crate::slack::SlackNotifier;
use async_trait::async_trait;
use bito_qa_core::{CaseReport, NotifyConfig};
use std::time::Duration;

/// A destination for run summaries.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Delivers every report, stopping at the first failure.
    async fn deliver(&self, reports: &[CaseReport]) -> Result<()>;
}

/// Builds one sink per configured destination.
///
/// Sinks that cannot be built are logged and left out.
pub async fn sinks_from_config(config: &NotifyConfig, timeout: Duration) -> Vec<Box<dyn ResultSink>> {
    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();

    if let Some(url) = config.slack_webhook_url.as_deref().filter(|u| !u.is_empty()) {
        match SlackNotifier::new(url, timeout) {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => tracing::error!(error = %e, "Slack sink disabled"),
        }
    }

    if let Some(sheets) = &config.sheets {
        match SheetsNotifier::from_config(sheets, timeout).await {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => tracing::error!(error = %e, "Sheets sink disabled"),
        }
    }

    if sinks.is_empty() {
        tracing::info!("No result sinks configured");
    }
    sinks
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl DeliveryReport {
    #[must_use]
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Attempts delivery on every sink. Failures are logged and collected, never raised.
pub async fn notify_all(sinks: &[Box<dyn ResultSink>], reports: &[CaseReport]) -> DeliveryReport {
    let mut outcome = DeliveryReport::default();

    for sink in sinks {
        match sink.deliver(reports).await {
            Ok(()) => {
                tracing::info!(sink = sink.name(), reports = reports.len(), "Results delivered");
                outcome.delivered.push(sink.name());
            }
            Err(e) => {
                tracing::error!(sink = sink.name(), error = %e, "Result delivery failed");
                outcome.failed.push((sink.name(), e.to_string()));
            }
        }
    }

    outcome
}
