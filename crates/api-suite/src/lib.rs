//! OHLC endpoint test suite.
//!
//! [`OhlcSuite::run`] executes every case against a live or mocked server and
//! returns one [`CaseOutcome`] per case; [`write_results`] persists them and
//! produces the [`SuiteSummary`] that feeds the result notifier.

pub mod case;
pub mod fixtures;
pub mod ohlc;
pub mod performance;
pub mod results;

/// Case name used for the suite's row in the results spreadsheet.
pub const SUITE_CASE_NAME: &str = "API_TEST_public/get_ohlc_data";

pub use case::{Attachment, CaseOutcome, CaseRun, CaseStatus};
pub use ohlc::{validate_ohlc_body, OhlcBodySummary, OhlcSuite};
pub use performance::{BurstSample, TimingSample};
pub use results::{load_summary, write_results, ResultsError, SuiteSummary};
