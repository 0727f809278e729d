//! Runs both reconciliation domains over one set of fetched tables.

use crate::order_limits::{reconcile_order_limits, OrderLimitsComparison};
use crate::outcome::Reconciliation;
use crate::stats::RunStatistics;
use crate::vip_fee::{reconcile_vip_fees, VipFeeComparison};
use bito_qa_core::RawTable;

/// The four input tables of one fee audit.
///
/// A source that could not be fetched carries the reason instead of a table;
/// its domain is then reported as not compared.
#[derive(Debug, Clone)]
pub struct FeeSources {
    pub web_order_limits: Result<RawTable, String>,
    pub web_vip_fees: Result<RawTable, String>,
    pub api_order_limits: Result<RawTable, String>,
    pub api_trading_fees: Result<RawTable, String>,
}

/// Both domain reconciliations and the combined check counts.
#[derive(Debug, Clone)]
pub struct FeeAuditReport {
    pub order_limits: Reconciliation<OrderLimitsComparison>,
    pub vip_fee: Reconciliation<VipFeeComparison>,
    pub statistics: RunStatistics,
}

impl FeeAuditReport {
    /// Number of web-side tables that were available for comparison.
    #[must_use]
    pub fn web_table_count(&self) -> usize {
        usize::from(self.order_limits.web_table.is_some())
            + usize::from(self.vip_fee.web_table.is_some())
    }
}

/// Runs both domains and sums their checks.
///
/// Each domain is isolated: a failure in one never prevents the other.
#[must_use]
pub fn reconcile_fees(sources: &FeeSources) -> FeeAuditReport {
    let order_limits = reconcile_order_limits(&sources.web_order_limits, &sources.api_order_limits);
    let vip_fee = reconcile_vip_fees(&sources.web_vip_fees, &sources.api_trading_fees);
    let statistics = order_limits.stats + vip_fee.stats;

    tracing::info!(
        total = statistics.total_checks(),
        passed = statistics.passed_checks(),
        failed = statistics.failed_checks(),
        "Fee reconciliation finished"
    );

    FeeAuditReport {
        order_limits,
        vip_fee,
        statistics,
    }
}
