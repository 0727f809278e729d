//! Order-limits reconciliation: web and API rows joined on trading pair.

use crate::error::{ReconcileError, Side};
use crate::normalize::clean_amount;
use crate::outcome::{Comparison, ComparisonOutcome, Reconciliation};
use crate::schema::OrderLimitRecord;
use crate::stats::RunStatistics;
use bito_qa_core::RawTable;
use std::collections::{BTreeMap, BTreeSet};

/// One pair present on both sides, with a flag per compared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLimitRow {
    pub pair: String,
    pub web_amount: String,
    pub api_amount: String,
    pub amount_match: bool,
    pub web_digits: String,
    pub api_digits: String,
    pub digits_match: bool,
}

impl OrderLimitRow {
    /// Compares one joined pair. Amounts match after [`clean_amount`]; digits must be equal text.
    #[must_use]
    pub fn compare(web: &OrderLimitRecord, api: &OrderLimitRecord) -> Self {
        Self {
            pair: web.pair.clone(),
            amount_match: clean_amount(&web.min_amount) == clean_amount(&api.min_amount),
            web_amount: web.min_amount.clone(),
            api_amount: api.min_amount.clone(),
            digits_match: web.min_digits == api.min_digits,
            web_digits: web.min_digits.clone(),
            api_digits: api.min_digits.clone(),
        }
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.amount_match && self.digits_match
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLimitsComparison {
    /// Inner join in web row order.
    pub rows: Vec<OrderLimitRow>,
    pub web_only: BTreeSet<String>,
    pub api_only: BTreeSet<String>,
}

impl OrderLimitsComparison {
    pub fn inconsistent(&self) -> impl Iterator<Item = &OrderLimitRow> {
        self.rows.iter().filter(|r| !r.is_consistent())
    }
}

impl Comparison for OrderLimitsComparison {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn inconsistent_count(&self) -> usize {
        self.inconsistent().count()
    }
}

/// Joins web and API records on pair. A pair repeated on either side joins with every match.
#[must_use]
pub fn join_on_pair(web: &[OrderLimitRecord], api: &[OrderLimitRecord]) -> OrderLimitsComparison {
    let mut api_by_pair: BTreeMap<&str, Vec<&OrderLimitRecord>> = BTreeMap::new();
    for record in api {
        api_by_pair.entry(record.pair.as_str()).or_default().push(record);
    }

    let rows = web
        .iter()
        .flat_map(|w| {
            api_by_pair
                .get(w.pair.as_str())
                .into_iter()
                .flatten()
                .map(move |a| OrderLimitRow::compare(w, a))
        })
        .collect();

    let web_pairs: BTreeSet<String> = web.iter().map(|r| r.pair.clone()).collect();
    let api_pairs: BTreeSet<String> = api.iter().map(|r| r.pair.clone()).collect();

    OrderLimitsComparison {
        rows,
        web_only: web_pairs.difference(&api_pairs).cloned().collect(),
        api_only: api_pairs.difference(&web_pairs).cloned().collect(),
    }
}

/// Reconciles the web order-limits table against the API order-limit records.
///
/// Checks counted: one for row-count equality whenever both tables exist,
/// then two per joined row (amount, digits). A missing source or column
/// counts one failed check in place of the field checks.
#[must_use]
pub fn reconcile_order_limits(
    web: &Result<RawTable, String>,
    api: &Result<RawTable, String>,
) -> Reconciliation<OrderLimitsComparison> {
    let (web, api_raw) = match (web, api) {
        (Err(reason), _) => {
            let error = ReconcileError::unavailable(Side::Web, reason.clone());
            tracing::warn!(error = %error, "Order limits not compared");
            return Reconciliation::unavailable(&error, None, api.as_ref().ok().cloned());
        }
        (Ok(web), Err(reason)) => {
            let error = ReconcileError::unavailable(Side::Api, reason.clone());
            tracing::warn!(error = %error, "Order limits not compared");
            return Reconciliation::unavailable(&error, Some(web.clone()), None);
        }
        (Ok(web), Ok(api)) => (web, api),
    };

    let api_records = OrderLimitRecord::from_api(api_raw);
    let api_table = match &api_records {
        Ok(records) => OrderLimitRecord::to_table(records),
        Err(_) => api_raw.clone(),
    };

    let mut stats = RunStatistics::new();
    let rows_match = web.len() == api_table.len();
    stats.record(rows_match);
    tracing::info!(
        web_rows = web.len(),
        api_rows = api_table.len(),
        rows_match,
        "Order limits row count"
    );

    let outcome = match (OrderLimitRecord::from_web(web), api_records) {
        (Ok(web_records), Ok(api_records)) => {
            let comparison = join_on_pair(&web_records, &api_records);
            for row in &comparison.rows {
                stats.record(row.amount_match);
                stats.record(row.digits_match);
            }
            tracing::info!(
                joined = comparison.rows.len(),
                inconsistent = comparison.inconsistent_count(),
                web_only = comparison.web_only.len(),
                api_only = comparison.api_only.len(),
                "Order limits compared"
            );
            ComparisonOutcome::Compared(comparison)
        }
        (Err(error), _) | (_, Err(error)) => {
            tracing::warn!(error = %error, "Order limits not compared");
            stats.record_failure();
            ComparisonOutcome::Error(error.to_string())
        }
    };

    Reconciliation {
        web_table: Some(web.clone()),
        api_table: Some(api_table),
        rows_match: Some(rows_match),
        outcome,
        stats,
    }
}
