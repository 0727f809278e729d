//! CLI commands for the QA harness.
//!
//! Each command completes with exit code 0 whenever the run itself finished,
//! whatever its check results; only configuration and I/O problems fail it.

pub mod api_suite;
pub mod compare_fees;
pub mod run_all;

pub use api_suite::{run_api_suite, ApiSuiteArgs};
pub use compare_fees::{run_compare_fees, CompareFeesArgs};
pub use run_all::{run_all, RunAllArgs};

use anyhow::{Context, Result};
use bito_qa_core::{AppConfig, CaseReport, ConfigLoader};
use bito_qa_notify::{notify_all, sinks_from_config};
use std::path::Path;
use std::time::Duration;

pub(crate) fn load_config(path: &str) -> Result<AppConfig> {
    ConfigLoader::load_from(path).with_context(|| format!("Failed to load config from {path}"))
}

/// Sends the reports to every configured sink unless `skip` is set.
pub(crate) async fn deliver(config: &AppConfig, reports: &[CaseReport], skip: bool) {
    if skip {
        tracing::info!("Notification skipped");
        return;
    }

    let timeout = Duration::from_secs(config.exchange.timeout_secs);
    let sinks = sinks_from_config(&config.notify, timeout).await;
    let outcome = notify_all(&sinks, reports).await;
    if !outcome.all_delivered() {
        tracing::warn!(failed = outcome.failed.len(), "Some result sinks were not reached");
    }
}

/// Link column value for a file path, relative to the working directory where possible.
pub(crate) fn public_link(config: &AppConfig, path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf());
    config
        .report
        .link_for(relative.to_string_lossy().replace('\\', "/").trim_start_matches('/'))
}
