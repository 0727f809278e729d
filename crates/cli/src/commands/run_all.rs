//! Fee comparison followed by the API suite.

use anyhow::Result;
use bito_qa_core::config_loader::DEFAULT_CONFIG_PATH;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the run-all command.
#[derive(Args, Debug, Clone)]
pub struct RunAllArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Read a saved copy of the fees page instead of downloading it
    #[arg(long)]
    pub page_fixture: Option<PathBuf>,

    /// Directory for the HTML report (overrides report.output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for case result files (overrides suite.results_dir)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Do not send the summaries to chat or the spreadsheet
    #[arg(long)]
    pub no_notify: bool,
}

/// Runs both flows and delivers their summaries in one notification pass.
///
/// The API suite runs even if the fee comparison could not write its report.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or neither flow completed.
pub async fn run_all(args: RunAllArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let mut reports = Vec::new();

    let fees = super::compare_fees::execute(
        &config,
        args.page_fixture.as_deref(),
        args.output_dir.as_deref(),
    )
    .await;
    match &fees {
        Ok(run) => {
            println!("Fee comparison report: {}", run.report_path.display());
            reports.push(run.case_report.clone());
        }
        Err(e) => tracing::error!(error = %e, "Fee comparison failed"),
    }

    let suite = super::api_suite::execute(&config, args.results_dir.as_deref()).await;
    match &suite {
        Ok(run) => {
            println!("API suite results: {}", run.results_dir.display());
            reports.push(run.case_report.clone());
        }
        Err(e) => tracing::error!(error = %e, "API suite failed"),
    }

    for report in &reports {
        println!("\n{}", report.chat_message());
    }
    super::deliver(&config, &reports, args.no_notify).await;

    match (fees, suite) {
        (Err(e), Err(_)) => Err(e.context("Both runs failed")),
        _ => Ok(()),
    }
}
