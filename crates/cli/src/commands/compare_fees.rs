//! Fees page versus API comparison command.

use anyhow::{Context, Result};
use bito_qa_bitopro::{BitoProClient, FeesPageSource, FixtureFeesPage, HttpFeesPage};
use bito_qa_core::config_loader::DEFAULT_CONFIG_PATH;
use bito_qa_core::{AppConfig, CaseCounts, CaseReport, FeesPageLayout, RawTable};
use bito_qa_reconcile::{
    reconcile_fees, render_html, Comparison, ComparisonOutcome, FeeAuditReport, FeeSources,
    Reconciliation,
};
use chrono::Local;
use clap::Args;
use std::path::{Path, PathBuf};

/// Case name of the fee comparison in the results spreadsheet.
pub const FEES_CASE_NAME: &str = "front_test_/ns/fees";

/// Arguments for the compare-fees command.
#[derive(Args, Debug, Clone)]
pub struct CompareFeesArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Read a saved copy of the fees page instead of downloading it
    #[arg(long)]
    pub page_fixture: Option<PathBuf>,

    /// Directory for the HTML report (overrides report.output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not send the summary to chat or the spreadsheet
    #[arg(long)]
    pub no_notify: bool,
}

/// What one comparison run produced.
#[derive(Debug)]
pub struct FeeRun {
    pub audit: FeeAuditReport,
    pub report_path: PathBuf,
    pub case_report: CaseReport,
}

/// Runs the compare-fees command.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or the report
/// cannot be written. Source and comparison failures end up in the report.
pub async fn run_compare_fees(args: CompareFeesArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let run = execute(&config, args.page_fixture.as_deref(), args.output_dir.as_deref()).await?;

    print_summary(&run);
    super::deliver(&config, &[run.case_report], args.no_notify).await;
    Ok(())
}

/// Fetches, reconciles, renders and writes the report.
///
/// # Errors
/// Returns an error if a client cannot be built or the report cannot be written.
pub async fn execute(
    config: &AppConfig,
    page_fixture: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<FeeRun> {
    let start_time = Local::now();

    let client = BitoProClient::new(&config.exchange).context("Failed to build API client")?;
    let page: Box<dyn FeesPageSource> = match page_fixture {
        Some(path) => Box::new(FixtureFeesPage::new(path)),
        None => Box::new(
            HttpFeesPage::new(&config.exchange).context("Failed to build page client")?,
        ),
    };

    let sources = collect_sources(page.as_ref(), &client, &config.fees_page).await;
    let audit = reconcile_fees(&sources);

    let generated_at = Local::now();
    let output_dir = output_dir.unwrap_or(&config.report.output_dir);
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let report_path = output_dir.join(format!("{}.html", generated_at.format("%Y%m%d_%H%M%S")));
    tokio::fs::write(&report_path, render_html(&audit, generated_at))
        .await
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    tracing::info!(path = %report_path.display(), "Report written");

    let counts = CaseCounts {
        fail: audit.statistics.failed_checks(),
        pass: audit.statistics.passed_checks(),
        ..CaseCounts::default()
    };
    let case_report = CaseReport::new(
        config.notify.platform.as_str(),
        FEES_CASE_NAME,
        counts,
        super::public_link(config, &report_path),
        start_time,
        Local::now(),
    );

    Ok(FeeRun {
        audit,
        report_path,
        case_report,
    })
}

/// Reads the page and the API concurrently and turns both into comparison inputs.
///
/// A failed source becomes an `Err` reason for the tables it would have supplied.
pub async fn collect_sources(
    page: &dyn FeesPageSource,
    client: &BitoProClient,
    layout: &FeesPageLayout,
) -> FeeSources {
    let (web, api) = tokio::join!(page.fetch_tables(layout), client.get_limitations_and_fees());

    let (web_order_limits, web_vip_fees) = match web {
        Ok(tables) => {
            tracing::info!(
                tables = tables.tables.len(),
                vip_block = tables.vip_fee_table.is_some(),
                "Fees page parsed"
            );
            (
                tables
                    .order_limits_table()
                    .cloned()
                    .ok_or_else(|| "no tables found on the fees page".to_string()),
                Ok(tables.vip_fee_table.unwrap_or_else(RawTable::default)),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Fees page unavailable");
            (Err(e.to_string()), Err(e.to_string()))
        }
    };

    let (api_order_limits, api_trading_fees) = match api {
        Ok((fees, _record)) => (Ok(fees.order_limits_table()), Ok(fees.trading_fee_table())),
        Err(e) => {
            tracing::error!(error = %e, "Limitations and fees API unavailable");
            (Err(e.to_string()), Err(e.to_string()))
        }
    };

    FeeSources {
        web_order_limits,
        web_vip_fees,
        api_order_limits,
        api_trading_fees,
    }
}

fn print_summary(run: &FeeRun) {
    let stats = &run.audit.statistics;
    println!("\n=== Fee Comparison ===");
    println!("Report:        {}", run.report_path.display());
    println!("Total checks:  {}", stats.total_checks());
    println!("Passed:        {} ({:.1}%)", stats.passed_checks(), stats.pass_rate());
    println!("Failed:        {} ({:.1}%)", stats.failed_checks(), stats.fail_rate());
    print_domain("Order limits", &run.audit.order_limits);
    print_domain("VIP fee tiers", &run.audit.vip_fee);
}

fn print_domain<C: Comparison>(label: &str, result: &Reconciliation<C>) {
    let rows = match result.rows_match {
        Some(true) => "row count matches",
        Some(false) => "row count differs",
        None => "row count unknown",
    };
    match &result.outcome {
        ComparisonOutcome::Compared(c) if c.inconsistent_count() == 0 => {
            println!("{label}: {rows}, all rows consistent");
        }
        ComparisonOutcome::Compared(c) => {
            println!("{label}: {rows}, {} inconsistent rows", c.inconsistent_count());
        }
        ComparisonOutcome::Error(e) => println!("{label}: not compared ({e})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bito_qa_bitopro::FeesPageTables;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticPage(Option<FeesPageTables>);

    #[async_trait::async_trait]
    impl FeesPageSource for StaticPage {
        async fn fetch_tables(
            &self,
            _layout: &FeesPageLayout,
        ) -> bito_qa_bitopro::Result<FeesPageTables> {
            self.0
                .clone()
                .ok_or_else(|| bito_qa_bitopro::BitoProError::Page("offline".to_string()))
        }
    }

    async fn api_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/provisioning/limitations-and-fees"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tradingFeeRate": [{"rank": 0, "makerFee": "0.002", "takerFee": "0.002"}],
                "orderFeesAndLimitations": [{
                    "pair": "btc_twd", "minimumOrderAmount": "0.0001",
                    "minimumOrderAmountBase": "BTC", "minimumOrderNumberOfDigits": 4
                }],
                "restrictionsOfWithdrawalFees": []
            })))
            .mount(&server)
            .await;
        server
    }

    fn client(server: &MockServer) -> BitoProClient {
        BitoProClient::new(&AppConfig::default().exchange)
            .expect("client")
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_page_without_tables_or_vip_block() {
        let server = api_server().await;
        let page = StaticPage(Some(FeesPageTables::default()));

        let sources = collect_sources(&page, &client(&server), &FeesPageLayout::default()).await;

        assert!(sources.web_order_limits.is_err());
        assert_eq!(sources.web_vip_fees, Ok(RawTable::default()));
        assert_eq!(sources.api_order_limits.as_ref().map(RawTable::len), Ok(1));
        assert_eq!(sources.api_trading_fees.as_ref().map(RawTable::len), Ok(1));
    }

    #[tokio::test]
    async fn test_unavailable_sources_carry_reasons() {
        let page = StaticPage(None);
        let offline = BitoProClient::new(&AppConfig::default().exchange)
            .expect("client")
            .with_base_url("http://127.0.0.1:1");

        let sources = collect_sources(&page, &offline, &FeesPageLayout::default()).await;

        assert!(sources.web_order_limits.is_err_and(|e| e.contains("offline")));
        assert!(sources.web_vip_fees.is_err());
        assert!(sources.api_order_limits.is_err());
        assert!(sources.api_trading_fees.is_err());
    }

    #[tokio::test]
    async fn test_execute_writes_timestamped_report() {
        let server = api_server().await;
        let dir = TempDir::new().expect("temp dir");
        let fixture = dir.path().join("fees.html");
        std::fs::write(
            &fixture,
            "<html><body><table><thead><tr><th>交易對</th><th>最小下單數量</th><th>最小下單位數</th></tr></thead>\
             <tbody><tr><td>btc_twd</td><td>0.0001 BTC</td><td>4</td></tr></tbody></table></body></html>",
        )
        .expect("write fixture");

        let mut config = AppConfig::default();
        config.exchange.api_url = server.uri();
        let output = dir.path().join("reports");

        let run = execute(&config, Some(&fixture), Some(&output)).await.expect("run");

        assert!(run.report_path.starts_with(&output));
        let name = run
            .report_path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert_eq!(name.len(), "20250311_224635.html".len());
        let html = std::fs::read_to_string(&run.report_path).expect("report");
        assert!(html.contains("1. Order Limits"));

        assert!(run.audit.order_limits.is_consistent());
        // order limits: 3 checks pass; VIP: block missing, row count fails
        assert_eq!(run.audit.statistics.total_checks(), 4);
        assert_eq!(run.case_report.case_name(), FEES_CASE_NAME);
        assert_eq!(run.case_report.counts().pass, 3);
        assert_eq!(run.case_report.counts().fail, 1);
        assert!(run.case_report.link().starts_with("http://localhost:8000/"));
    }
}
