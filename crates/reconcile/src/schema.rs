//! Column schemas for the compared tables.
//!
//! Each record type declares which columns it reads and what an absent
//! optional column defaults to, so comparison code never probes raw tables.

use crate::error::{ReconcileError, Result, Side};
use bito_qa_core::RawTable;

// ===== Web page columns =====

pub const WEB_PAIR: &str = "交易對";
pub const WEB_MIN_AMOUNT: &str = "最小下單數量";
pub const WEB_MIN_DIGITS: &str = "最小下單位數";

pub const WEB_VIP_LEVEL: &str = "等級";
pub const WEB_VIP_VOLUME: &str = "前 30 天交易量";
pub const WEB_VIP_FEE: &str = "Maker / Taker";

// ===== API columns =====

pub const API_PAIR: &str = "pair";
pub const API_MIN_AMOUNT: &str = "minimumOrderAmount";
pub const API_MIN_AMOUNT_BASE: &str = "minimumOrderAmountBase";
pub const API_MIN_DIGITS: &str = "minimumOrderNumberOfDigits";

pub const API_RANK: &str = "rank";
pub const API_VOLUME_SYMBOL: &str = "twdVolumeSymbol";
pub const API_VOLUME: &str = "twdVolume";
pub const API_MAKER_FEE: &str = "makerFee";
pub const API_TAKER_FEE: &str = "takerFee";

/// Required cell: the column must exist and the row must carry a value.
fn required<'a>(table: &'a RawTable, side: Side, row: usize, column: &str) -> Result<&'a str> {
    table
        .get(row, column)
        .ok_or_else(|| ReconcileError::missing_cell(side, row, column))
}

/// Optional cell: `None` when the column is absent, an error when only the cell is.
fn optional<'a>(
    table: &'a RawTable,
    side: Side,
    row: usize,
    column: &str,
) -> Result<Option<&'a str>> {
    if table.has_column(column) {
        required(table, side, row, column).map(Some)
    } else {
        Ok(None)
    }
}

fn require_columns(table: &RawTable, side: Side, columns: &[&str]) -> Result<()> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(missing) => Err(ReconcileError::missing_column(side, *missing)),
        None => Ok(()),
    }
}

// =============================================================================
// Order limits
// =============================================================================

/// Minimum order amount and digit count for one pair, in web notation.
///
/// Pair and amount are required on both sides. The digit count is optional
/// and defaults to an empty string when its column is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLimitRecord {
    pub pair: String,
    /// Amount with unit, e.g. `"0.0001 BTC"`.
    pub min_amount: String,
    pub min_digits: String,
}

impl OrderLimitRecord {
    /// Reads the web order-limits table.
    ///
    /// # Errors
    /// Returns [`ReconcileError::MissingColumn`] if a required column is absent
    /// and [`ReconcileError::MissingCell`] for a short row.
    pub fn from_web(table: &RawTable) -> Result<Vec<Self>> {
        require_columns(table, Side::Web, &[WEB_PAIR, WEB_MIN_AMOUNT])?;

        (0..table.len())
            .map(|row| -> Result<Self> {
                Ok(Self {
                    pair: required(table, Side::Web, row, WEB_PAIR)?.to_string(),
                    min_amount: required(table, Side::Web, row, WEB_MIN_AMOUNT)?.to_string(),
                    min_digits: optional(table, Side::Web, row, WEB_MIN_DIGITS)?
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect()
    }

    /// Reads API order-limit records; the amount becomes `"<amount> <base>"`.
    ///
    /// An API table with no records has no columns either and yields no records.
    ///
    /// # Errors
    /// Same as [`Self::from_web`].
    pub fn from_api(table: &RawTable) -> Result<Vec<Self>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }
        require_columns(
            table,
            Side::Api,
            &[API_PAIR, API_MIN_AMOUNT, API_MIN_AMOUNT_BASE],
        )?;

        (0..table.len())
            .map(|row| -> Result<Self> {
                let amount = required(table, Side::Api, row, API_MIN_AMOUNT)?;
                let base = required(table, Side::Api, row, API_MIN_AMOUNT_BASE)?;
                Ok(Self {
                    pair: required(table, Side::Api, row, API_PAIR)?.to_string(),
                    min_amount: format!("{amount} {base}"),
                    min_digits: optional(table, Side::Api, row, API_MIN_DIGITS)?
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect()
    }

    /// Renders records as a table with the web column names.
    #[must_use]
    pub fn to_table(records: &[Self]) -> RawTable {
        RawTable::from_cells(
            vec![
                WEB_PAIR.to_string(),
                WEB_MIN_AMOUNT.to_string(),
                WEB_MIN_DIGITS.to_string(),
            ],
            records
                .iter()
                .map(|r| vec![r.pair.clone(), r.min_amount.clone(), r.min_digits.clone()])
                .collect(),
        )
    }
}

// =============================================================================
// VIP tiers
// =============================================================================

/// Level label, 30-day volume text and combined maker/taker fee text for one tier.
///
/// Every column is optional. Absent columns default as follows:
/// - level: `"VIP <position>"`
/// - volume: empty string
/// - fee: empty string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipTierRecord {
    pub level: String,
    pub volume: String,
    pub fee: String,
}

impl VipTierRecord {
    /// Reads row `row` of the web VIP block.
    ///
    /// # Errors
    /// Returns [`ReconcileError::MissingCell`] when a present column has no value in this row.
    pub fn from_web(table: &RawTable, row: usize) -> Result<Self> {
        let level = optional(table, Side::Web, row, WEB_VIP_LEVEL)?
            .map_or_else(|| format!("VIP {row}"), str::to_string);
        let volume = optional(table, Side::Web, row, WEB_VIP_VOLUME)?
            .unwrap_or_default()
            .to_string();
        let fee = optional(table, Side::Web, row, WEB_VIP_FEE)?
            .unwrap_or_default()
            .to_string();

        Ok(Self { level, volume, fee })
    }

    /// Reads row `row` of the API trading-fee table.
    ///
    /// Volume is `"<symbol> <volume>"` only when both columns exist; fee is
    /// `"<maker> / <taker>"` only when both values are non-empty.
    ///
    /// # Errors
    /// Returns [`ReconcileError::MissingCell`] when a present column has no value in this row.
    pub fn from_api(table: &RawTable, row: usize) -> Result<Self> {
        let level = optional(table, Side::Api, row, API_RANK)?
            .map_or_else(|| format!("VIP {row}"), |rank| format!("VIP {rank}"));

        let symbol = optional(table, Side::Api, row, API_VOLUME_SYMBOL)?;
        let amount = optional(table, Side::Api, row, API_VOLUME)?;
        let volume = match (symbol, amount) {
            (Some(symbol), Some(amount)) => format!("{symbol} {amount}"),
            _ => String::new(),
        };

        let maker = optional(table, Side::Api, row, API_MAKER_FEE)?.unwrap_or_default();
        let taker = optional(table, Side::Api, row, API_TAKER_FEE)?.unwrap_or_default();
        let fee = if maker.is_empty() || taker.is_empty() {
            String::new()
        } else {
            format!("{maker} / {taker}")
        };

        Ok(Self { level, volume, fee })
    }
}
