use bito_qa_api_suite::{load_summary, write_results, CaseRun, CaseStatus, SUITE_CASE_NAME};
use bito_qa_bitopro::{BitoProClient, FeesPageSource, FixtureFeesPage};
use bito_qa_core::{AppConfig, CaseCounts, CaseReport, FeesPageLayout};
use bito_qa_notify::{notify_all, ResultSink, SlackNotifier};
use bito_qa_reconcile::{reconcile_fees, render_html, FeeSources};
use chrono::Local;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fees_page.html")
}

/// API side of the fixture page: VIP tiers agree, eth_twd digits differ.
fn limitations_and_fees() -> Value {
    json!({
        "tradingFeeRate": [
            {"rank": 0, "twdVolumeSymbol": "<", "twdVolume": "3000000", "makerFee": "0.002", "takerFee": "0.002"},
            {"rank": 1, "twdVolumeSymbol": "≥", "twdVolume": "3000000", "makerFee": "0.0018", "takerFee": "0.0019"}
        ],
        "orderFeesAndLimitations": [
            {"pair": "btc_twd", "minimumOrderAmount": "0.0001", "minimumOrderAmountBase": "BTC", "minimumOrderNumberOfDigits": 4},
            {"pair": "eth_twd", "minimumOrderAmount": "0.001", "minimumOrderAmountBase": "ETH", "minimumOrderNumberOfDigits": 2}
        ],
        "restrictionsOfWithdrawalFees": []
    })
}

async fn api_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/provisioning/limitations-and-fees"))
        .and(query_param("locale", "zh-TW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(limitations_and_fees()))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_fee_audit_from_saved_page() {
    let server = api_server().await;
    let config = AppConfig::default();
    let client = BitoProClient::new(&config.exchange)
        .expect("client")
        .with_base_url(server.uri());

    let page = FixtureFeesPage::new(fixture_path())
        .fetch_tables(&FeesPageLayout::default())
        .await
        .expect("fixture page");
    assert_eq!(page.tables.len(), 2);

    let (fees, _record) = client.get_limitations_and_fees().await.expect("api");
    let sources = FeeSources {
        web_order_limits: page
            .order_limits_table()
            .cloned()
            .ok_or_else(|| "no tables".to_string()),
        web_vip_fees: page.vip_fee_table.clone().ok_or_else(|| "no VIP block".to_string()),
        api_order_limits: Ok(fees.order_limits_table()),
        api_trading_fees: Ok(fees.trading_fee_table()),
    };

    let audit = reconcile_fees(&sources);

    // order limits: 1 row count + 2 pairs * 2 fields; VIP: 1 row count + 2 tiers * 3 fields
    assert_eq!(audit.statistics.total_checks(), 12);
    assert_eq!(audit.statistics.failed_checks(), 1);
    assert!(!audit.order_limits.is_consistent());
    assert!(audit.vip_fee.is_consistent());
    assert_eq!(audit.web_table_count(), 2);

    let html = render_html(&audit, Local::now());
    assert!(html.contains("Found 1 inconsistent pairs:"));
    assert!(html.contains("eth_twd"));
    assert!(html.contains("VIP fee tiers: web and API data are consistent"));
    assert!(html.contains("11 (91.7%)"));
}

#[tokio::test]
async fn test_unreachable_api_is_reported_not_fatal() {
    let page = FixtureFeesPage::new(fixture_path())
        .fetch_tables(&FeesPageLayout::default())
        .await
        .expect("fixture page");
    let client = BitoProClient::new(&AppConfig::default().exchange)
        .expect("client")
        .with_base_url("http://127.0.0.1:1");

    let reason = client
        .get_limitations_and_fees()
        .await
        .expect_err("nothing listens on port 1")
        .to_string();
    let sources = FeeSources {
        web_order_limits: page
            .order_limits_table()
            .cloned()
            .ok_or_else(|| "no tables".to_string()),
        web_vip_fees: page.vip_fee_table.clone().ok_or_else(|| "no VIP block".to_string()),
        api_order_limits: Err(reason.clone()),
        api_trading_fees: Err(reason),
    };

    let audit = reconcile_fees(&sources);
    let html = render_html(&audit, Local::now());

    assert_eq!(audit.statistics.passed_checks(), 0);
    assert_eq!(audit.statistics.failed_checks(), 2);
    assert!(html.contains("Comparison not performed"));
}

#[tokio::test]
async fn test_suite_results_reach_chat() {
    let dir = TempDir::new().expect("temp dir");
    let mut failed = CaseRun::start("invalid_pair");
    failed.fail("invalid pair: expected a rejection, got data");
    let outcomes = vec![
        CaseRun::start("valid_params").finish(),
        failed.finish(),
        CaseRun::start("response_time").broken("timed out"),
    ];

    let summary = write_results(dir.path(), &outcomes).await.expect("write");
    assert_eq!(load_summary(dir.path()).await.expect("load"), summary);
    assert_eq!(outcomes[2].status, CaseStatus::Broken);

    let start = Local::now();
    let report = CaseReport::new(
        "Production",
        SUITE_CASE_NAME,
        CaseCounts::from(summary),
        "http://localhost:8000/reports/api-results",
        start,
        start + chrono::Duration::seconds(5),
    );
    // broken cases are listed but not added into the total
    assert_eq!(report.total(), 2);

    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({"text": report.chat_message()})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&chat)
        .await;

    let sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(
        SlackNotifier::new(format!("{}/hook", chat.uri()), Duration::from_secs(5)).expect("slack"),
    )];
    let delivery = notify_all(&sinks, &[report]).await;

    assert!(delivery.all_delivered());
}

#[tokio::test]
async fn test_compare_fees_command_end_to_end() {
    let server = api_server().await;
    let dir = TempDir::new().expect("temp dir");
    let output_dir = dir.path().join("fees");

    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_bito-qa"))
        .arg("compare-fees")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("--page-fixture")
        .arg(fixture_path())
        .arg("--output-dir")
        .arg(&output_dir)
        .arg("--no-notify")
        .env("BITO_QA_EXCHANGE__API_URL", server.uri())
        .status()
        .await
        .expect("spawn bito-qa");

    // inconsistent data still completes the run
    assert!(status.success());
    let reports: Vec<_> = std::fs::read_dir(&output_dir)
        .expect("output dir")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "html"))
        .collect();
    assert_eq!(reports.len(), 1);
    let html = std::fs::read_to_string(reports[0].path()).expect("report");
    assert!(html.contains("BitoPro Fee Data Comparison Report"));
}
