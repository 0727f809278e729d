//! Web versus API reconciliation of BitoPro fee data.
//!
//! Two domains are compared: order limits (joined on trading pair) and VIP
//! fee tiers (aligned by position). Every atomic comparison is counted in a
//! [`RunStatistics`], and [`render_html`] turns the result into a standalone
//! report.

pub mod engine;
pub mod error;
pub mod normalize;
pub mod order_limits;
pub mod outcome;
pub mod report;
pub mod schema;
pub mod stats;
pub mod vip_fee;

pub use engine::{reconcile_fees, FeeAuditReport, FeeSources};
pub use error::{ReconcileError, Side};
pub use normalize::{clean_amount, normalize_fee, normalize_volume, VolumeValue};
pub use order_limits::{reconcile_order_limits, OrderLimitRow, OrderLimitsComparison};
pub use outcome::{Comparison, ComparisonOutcome, Reconciliation};
pub use report::{escape_html, render_html};
pub use schema::{OrderLimitRecord, VipTierRecord};
pub use stats::RunStatistics;
pub use vip_fee::{reconcile_vip_fees, VipFeeComparison, VipFeeRow};
