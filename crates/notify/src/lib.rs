//! Result notifier: run summaries to a chat webhook and a spreadsheet.
//!
//! Delivery is best-effort. [`notify_all`] logs and collects failures so a
//! run's own verdict never depends on whether its summary arrived.

pub mod error;
pub mod sheets;
pub mod sink;
pub mod slack;

pub use error::{NotifyError, Result};
pub use sheets::{batch_update_body, ServiceAccountKey, SheetsNotifier, TokenSource};
pub use sink::{notify_all, sinks_from_config, DeliveryReport, ResultSink};
pub use slack::SlackNotifier;
