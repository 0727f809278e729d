use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub fees_page: FeesPageLayout,
    pub suite: SuiteConfig,
    pub report: ReportConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_url: String,
    pub fees_page_url: String,
    pub locale: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

/// Where the VIP fee block lives in the fees page markup.
///
/// The block is not a `<table>`: it is a heading followed by a container of
/// styled rows, so it is located by heading text and class names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesPageLayout {
    pub vip_heading_tag: String,
    pub vip_heading_text: String,
    pub vip_row_classes: Vec<String>,
    pub vip_cell_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub pair: String,
    pub resolution: String,
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub results_dir: PathBuf,
    pub concurrency_levels: Vec<usize>,
    pub timing_resolutions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub link_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub platform: String,
    pub slack_webhook_url: Option<String>,
    pub sheets: Option<SheetsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Numeric sheet id (the `gid` in the sheet URL), 0 for the first sheet.
    pub worksheet_id: i64,
    pub credentials_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub api_url: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.bitopro.com/v3".to_string(),
            fees_page_url: "https://www.bitopro.com/ns/fees".to_string(),
            locale: "zh-TW".to_string(),
            timeout_secs: 30,
            requests_per_minute: 600,
        }
    }
}

impl Default for FeesPageLayout {
    fn default() -> Self {
        Self {
            vip_heading_tag: "h4".to_string(),
            vip_heading_text: "VIP 費用等級列表".to_string(),
            vip_row_classes: vec!["sc-c62c0220-2".to_string(), "sc-c62c0220-3".to_string()],
            vip_cell_class: "sc-c62c0220-1".to_string(),
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            pair: "btc_twd".to_string(),
            resolution: "1h".to_string(),
            // 2021-01-01 00:00:00 UTC .. 2021-01-02 00:00:00 UTC
            from_timestamp: 1_609_459_200,
            to_timestamp: 1_609_545_600,
            results_dir: PathBuf::from("reports/api-results"),
            concurrency_levels: vec![1, 5, 10],
            timing_resolutions: ["1m", "5m", "15m", "30m", "1h", "1d"]
                .iter()
                .map(|r| (*r).to_string())
                .collect(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports/fees"),
            link_base: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            platform: "Production".to_string(),
            slack_webhook_url: None,
            sheets: None,
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            worksheet_id: 0,
            credentials_path: None,
            access_token: None,
            api_url: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

impl ReportConfig {
    /// Builds the public link for a file written under the working directory.
    #[must_use]
    pub fn link_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.link_base.trim_end_matches('/'),
            relative_path.trim_start_matches("./")
        )
    }
}
