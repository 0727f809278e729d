use crate::error::ReconcileError;
use crate::stats::RunStatistics;
use bito_qa_core::RawTable;

/// Result of comparing one domain: either the aligned rows or why no comparison happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome<C> {
    Compared(C),
    Error(String),
}

impl<C> ComparisonOutcome<C> {
    #[must_use]
    pub fn compared(&self) -> Option<&C> {
        match self {
            Self::Compared(c) => Some(c),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Compared(_) => None,
            Self::Error(message) => Some(message),
        }
    }
}

/// Row-level view shared by the comparison domains.
pub trait Comparison {
    /// Number of aligned rows.
    fn row_count(&self) -> usize;

    /// Number of aligned rows with at least one false flag.
    fn inconsistent_count(&self) -> usize;
}

/// Everything one domain produced: both source tables, the row-count verdict,
/// the comparison and the checks it performed.
///
/// `rows_match` is `None` only when a source table was unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<C> {
    pub web_table: Option<RawTable>,
    pub api_table: Option<RawTable>,
    pub rows_match: Option<bool>,
    pub outcome: ComparisonOutcome<C>,
    pub stats: RunStatistics,
}

impl<C: Comparison> Reconciliation<C> {
    /// A domain whose source could not be read; one failed check.
    #[must_use]
    pub fn unavailable(
        error: &ReconcileError,
        web_table: Option<RawTable>,
        api_table: Option<RawTable>,
    ) -> Self {
        let mut stats = RunStatistics::new();
        stats.record_failure();
        Self {
            web_table,
            api_table,
            rows_match: None,
            outcome: ComparisonOutcome::Error(error.to_string()),
            stats,
        }
    }

    /// True when the comparison ran and every aligned row matched on every field.
    ///
    /// Row-count equality is reported separately through `rows_match`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.outcome
            .compared()
            .is_some_and(|c| c.inconsistent_count() == 0)
    }
}
