//! Result files and status counts.
//!
//! Each case is written to `<name>-result.json`; the counts go to
//! `summary.json` beside them. A results directory can be summarized again
//! later from the case files alone.

use crate::case::{CaseOutcome, CaseStatus};
use bito_qa_core::CaseCounts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const RESULT_SUFFIX: &str = "-result.json";
const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid result file {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ResultsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn serialization(path: &Path, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResultsError>;

/// Number of cases per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub passed: u64,
    pub failed: u64,
    pub broken: u64,
    pub skipped: u64,
    pub known: u64,
}

impl SuiteSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a CaseOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.count(outcome.status);
        }
        summary
    }

    fn count(&mut self, status: CaseStatus) {
        match status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed => self.failed += 1,
            CaseStatus::Broken => self.broken += 1,
            CaseStatus::Skipped => self.skipped += 1,
            CaseStatus::Known => self.known += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.passed + self.failed + self.broken + self.skipped + self.known
    }
}

impl From<SuiteSummary> for CaseCounts {
    fn from(summary: SuiteSummary) -> Self {
        Self {
            fail: summary.failed,
            broken: summary.broken,
            skip: summary.skipped,
            pass: summary.passed,
            known: summary.known,
        }
    }
}

/// File name a case is stored under.
#[must_use]
pub fn result_file_name(case_name: &str) -> String {
    let safe: String = case_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{safe}{RESULT_SUFFIX}")
}

/// Writes every case file and the summary, creating `dir` if needed.
///
/// # Errors
/// Returns the first I/O or serialization failure.
pub async fn write_results(dir: &Path, outcomes: &[CaseOutcome]) -> Result<SuiteSummary> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ResultsError::io(dir, e))?;

    for outcome in outcomes {
        let path = dir.join(result_file_name(&outcome.name));
        let json = serde_json::to_vec_pretty(outcome)
            .map_err(|e| ResultsError::serialization(&path, e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ResultsError::io(&path, e))?;
    }

    let summary = SuiteSummary::from_outcomes(outcomes);
    let path = dir.join(SUMMARY_FILE);
    let json =
        serde_json::to_vec_pretty(&summary).map_err(|e| ResultsError::serialization(&path, e))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| ResultsError::io(&path, e))?;

    tracing::info!(
        dir = %dir.display(),
        cases = outcomes.len(),
        passed = summary.passed,
        failed = summary.failed,
        broken = summary.broken,
        "Wrote suite results"
    );

    Ok(summary)
}

/// Counts statuses from the `*-result.json` files in `dir`.
///
/// # Errors
/// Returns an error if the directory or a result file cannot be read or parsed.
pub async fn load_summary(dir: &Path) -> Result<SuiteSummary> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ResultsError::io(dir, e))?;
    let mut summary = SuiteSummary::default();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ResultsError::io(dir, e))?
    {
        let path = entry.path();
        let is_result = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(RESULT_SUFFIX));
        if !is_result {
            continue;
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ResultsError::io(&path, e))?;
        let outcome: CaseOutcome =
            serde_json::from_slice(&bytes).map_err(|e| ResultsError::serialization(&path, e))?;
        summary.count(outcome.status);
    }

    Ok(summary)
}
