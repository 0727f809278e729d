//! Reasons a reconciliation domain could not be compared.
//!
//! These never escape the engine as `Err`: they become
//! [`ComparisonOutcome::Error`](crate::ComparisonOutcome::Error) values that
//! count as one failed check.

use std::fmt;
use thiserror::Error;

/// Which source a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Web,
    Api,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            Self::Api => f.write_str("API"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The source table could not be obtained at all.
    #[error("{side} data unavailable: {reason}")]
    SourceUnavailable { side: Side, reason: String },

    /// A column the comparison keys on is absent.
    #[error("{side} table has no {column:?} column")]
    MissingColumn { side: Side, column: String },

    /// The column exists but this row carries no value for it.
    #[error("{side} table row {row} has no value for {column:?}")]
    MissingCell {
        side: Side,
        row: usize,
        column: String,
    },
}

impl ReconcileError {
    pub fn unavailable(side: Side, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            side,
            reason: reason.into(),
        }
    }

    pub fn missing_column(side: Side, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            side,
            column: column.into(),
        }
    }

    pub fn missing_cell(side: Side, row: usize, column: impl Into<String>) -> Self {
        Self::MissingCell {
            side,
            row,
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
