//! VIP fee reconciliation: web tiers against API trading-fee records, by position.

use crate::error::{ReconcileError, Side};
use crate::normalize::{normalize_fee, normalize_volume};
use crate::outcome::{Comparison, ComparisonOutcome, Reconciliation};
use crate::schema::VipTierRecord;
use crate::stats::RunStatistics;
use bito_qa_core::RawTable;

/// Row `position` of both tables, with level, volume and fee flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipFeeRow {
    pub position: usize,
    pub web_level: String,
    pub api_level: String,
    pub level_match: bool,
    pub web_volume: String,
    pub api_volume: String,
    pub volume_match: bool,
    pub web_fee: String,
    pub api_fee: String,
    pub fee_match: bool,
    pub web_fee_normalized: String,
    pub api_fee_normalized: String,
}

impl VipFeeRow {
    /// Levels compare as raw text, volumes after [`normalize_volume`], fees after [`normalize_fee`].
    #[must_use]
    pub fn compare(position: usize, web: VipTierRecord, api: VipTierRecord) -> Self {
        let web_fee_normalized = normalize_fee(&web.fee);
        let api_fee_normalized = normalize_fee(&api.fee);

        Self {
            position,
            level_match: web.level == api.level,
            volume_match: normalize_volume(&web.volume) == normalize_volume(&api.volume),
            fee_match: web_fee_normalized == api_fee_normalized,
            web_level: web.level,
            api_level: api.level,
            web_volume: web.volume,
            api_volume: api.volume,
            web_fee: web.fee,
            api_fee: api.fee,
            web_fee_normalized,
            api_fee_normalized,
        }
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.level_match && self.volume_match && self.fee_match
    }

    /// Fees that differ as written but agree once percent and fraction notation is erased.
    #[must_use]
    pub fn fee_differs_only_in_notation(&self) -> bool {
        self.fee_match && self.web_fee != self.api_fee
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipFeeComparison {
    pub rows: Vec<VipFeeRow>,
}

impl VipFeeComparison {
    pub fn inconsistent(&self) -> impl Iterator<Item = &VipFeeRow> {
        self.rows.iter().filter(|r| !r.is_consistent())
    }

    /// Number of rows whose fee only matched after normalization.
    #[must_use]
    pub fn notation_only_fee_differences(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.fee_differs_only_in_notation())
            .count()
    }
}

impl Comparison for VipFeeComparison {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn inconsistent_count(&self) -> usize {
        self.inconsistent().count()
    }
}

/// Aligns row `i` of the web block with row `i` of the API table, up to the shorter length.
///
/// # Errors
/// Returns the first [`ReconcileError::MissingCell`] met while reading a row.
pub fn align_by_position(
    web: &RawTable,
    api: &RawTable,
) -> Result<VipFeeComparison, ReconcileError> {
    let rows = (0..web.len().min(api.len()))
        .map(|i| -> Result<VipFeeRow, ReconcileError> {
            Ok(VipFeeRow::compare(
                i,
                VipTierRecord::from_web(web, i)?,
                VipTierRecord::from_api(api, i)?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VipFeeComparison { rows })
}

/// Reconciles the web VIP block against the API trading-fee table.
///
/// Checks counted: one for row-count equality whenever both tables exist,
/// then three per aligned row (level, volume, fee). If reading any row fails,
/// the field checks already gathered are dropped and one failed check stands
/// in for the whole comparison.
#[must_use]
pub fn reconcile_vip_fees(
    web: &Result<RawTable, String>,
    api: &Result<RawTable, String>,
) -> Reconciliation<VipFeeComparison> {
    let (web, api) = match (web, api) {
        (Err(reason), _) => {
            let error = ReconcileError::unavailable(Side::Web, reason.clone());
            tracing::warn!(error = %error, "VIP fees not compared");
            return Reconciliation::unavailable(&error, None, api.as_ref().ok().cloned());
        }
        (Ok(web), Err(reason)) => {
            let error = ReconcileError::unavailable(Side::Api, reason.clone());
            tracing::warn!(error = %error, "VIP fees not compared");
            return Reconciliation::unavailable(&error, Some(web.clone()), None);
        }
        (Ok(web), Ok(api)) => (web, api),
    };

    let mut stats = RunStatistics::new();
    let rows_match = web.len() == api.len();
    stats.record(rows_match);
    tracing::info!(
        web_rows = web.len(),
        api_rows = api.len(),
        rows_match,
        "VIP fee row count"
    );

    let outcome = match align_by_position(web, api) {
        Ok(comparison) => {
            for row in &comparison.rows {
                stats.record(row.level_match);
                stats.record(row.volume_match);
                stats.record(row.fee_match);
            }
            tracing::info!(
                aligned = comparison.rows.len(),
                inconsistent = comparison.inconsistent_count(),
                "VIP fees compared"
            );
            ComparisonOutcome::Compared(comparison)
        }
        Err(error) => {
            tracing::warn!(error = %error, "VIP fee comparison failed");
            stats.record_failure();
            ComparisonOutcome::Error(error.to_string())
        }
    };

    Reconciliation {
        web_table: Some(web.clone()),
        api_table: Some(api.clone()),
        rows_match: Some(rows_match),
        outcome,
        stats,
    }
}
