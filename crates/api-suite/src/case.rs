//! Outcome of one suite case, with the evidence gathered while running it.

use bito_qa_bitopro::{BitoProError, ExchangeRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Final verdict of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Every assertion held.
    Passed,
    /// An assertion about the server's behavior did not hold.
    Failed,
    /// The case could not exercise the server (transport error, timeout).
    Broken,
    Skipped,
    /// Failure already tracked elsewhere.
    Known,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
            Self::Skipped => "skipped",
            Self::Known => "known",
        };
        f.write_str(s)
    }
}

/// A named piece of evidence: request/response captures, error texts, timing tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub body: String,
}

impl Attachment {
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: "text/plain".to_string(),
            body: body.into(),
        }
    }

    pub fn json(name: impl Into<String>, value: &Value) -> Self {
        Self {
            name: name.into(),
            content_type: "application/json".to_string(),
            body: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// Serialized form of a finished case, one `<name>-result.json` per case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub status: CaseStatus,
    pub message: Option<String>,
    pub attachments: Vec<Attachment>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl CaseOutcome {
    /// Looks up an attachment by exact name.
    #[must_use]
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }
}

/// Collects attachments while a case runs, then seals them into a [`CaseOutcome`].
#[derive(Debug)]
pub struct CaseRun {
    name: String,
    start: DateTime<Utc>,
    attachments: Vec<Attachment>,
    failures: Vec<String>,
}

impl CaseRun {
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::info!(case = %name, "Case started");
        Self {
            name,
            start: Utc::now(),
            attachments: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Attaches the request and response halves of a captured exchange.
    pub fn attach_record(&mut self, label: &str, record: &ExchangeRecord) {
        self.attach(Attachment::json(
            format!("{label} request"),
            &serde_json::to_value(&record.request).unwrap_or(Value::Null),
        ));
        self.attach(Attachment::json(
            format!("{label} response"),
            &serde_json::to_value(&record.response).unwrap_or(Value::Null),
        ));
    }

    /// Attaches an error message, plus the status, headers and body of API errors.
    pub fn attach_error(&mut self, label: &str, error: &BitoProError) {
        self.attach(Attachment::text(format!("{label} error"), error.to_string()));
        if let BitoProError::Api {
            status,
            body,
            headers,
            record,
        } = error
        {
            self.attach(Attachment::json(
                format!("{label} error response"),
                &json!({
                    "status": status,
                    "headers": headers,
                    "body": body.to_value(),
                }),
            ));
            self.attach(Attachment::json(
                format!("{label} request"),
                &serde_json::to_value(&record.request).unwrap_or(Value::Null),
            ));
        }
    }

    /// Records a failed assertion; the case keeps running.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(case = %self.name, %message, "Assertion failed");
        self.failures.push(message);
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Passed unless [`fail`](Self::fail) was called.
    #[must_use]
    pub fn finish(self) -> CaseOutcome {
        if self.failures.is_empty() {
            self.finish_with(CaseStatus::Passed, None)
        } else {
            let message = self.failures.join("\n");
            self.finish_with(CaseStatus::Failed, Some(message))
        }
    }

    /// Ends the case as broken, keeping everything attached so far.
    #[must_use]
    pub fn broken(self, message: impl Into<String>) -> CaseOutcome {
        self.finish_with(CaseStatus::Broken, Some(message.into()))
    }

    fn finish_with(self, status: CaseStatus, message: Option<String>) -> CaseOutcome {
        tracing::info!(case = %self.name, %status, "Case finished");
        CaseOutcome {
            name: self.name,
            status,
            message,
            attachments: self.attachments,
            start: self.start,
            stop: Utc::now(),
        }
    }
}
