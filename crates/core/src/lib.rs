pub mod case_report;
pub mod config;
pub mod config_loader;
pub mod table;

pub use case_report::{CaseCounts, CaseReport, SHEET_HEADERS};
pub use config::{
    AppConfig, ExchangeConfig, FeesPageLayout, NotifyConfig, ReportConfig, SheetsConfig,
    SuiteConfig,
};
pub use config_loader::ConfigLoader;
pub use table::{RawTable, Row};
