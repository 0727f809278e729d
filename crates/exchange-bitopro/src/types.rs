//! Typed payloads for the BitoPro public endpoints.

use bito_qa_core::RawTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resolutions accepted by `/trading-history`, for reference only.
///
/// The client does not validate against this list.
pub const RESOLUTIONS: [&str; 12] = [
    "1m", "5m", "15m", "30m", "1h", "3h", "4h", "6h", "12h", "1d", "1w", "1M",
];

/// Parameters of one `/trading-history/{pair}` request.
///
/// Bounds are `i128` so probes can send values outside the int64 range;
/// a `None` bound leaves the query parameter out entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcQuery {
    pub pair: String,
    pub resolution: String,
    pub from: Option<i128>,
    pub to: Option<i128>,
}

impl OhlcQuery {
    #[must_use]
    pub fn new(pair: impl Into<String>, resolution: impl Into<String>, from: i64, to: i64) -> Self {
        Self {
            pair: pair.into(),
            resolution: resolution.into(),
            from: Some(i128::from(from)),
            to: Some(i128::from(to)),
        }
    }

    /// Query string parameters in request order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("resolution".to_string(), self.resolution.clone())];
        if let Some(from) = self.from {
            params.push(("from".to_string(), from.to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to".to_string(), to.to_string()));
        }
        params
    }
}

/// One OHLC candle; prices and volume are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcResponse {
    pub data: Vec<Candle>,
}

/// Payload of `/provisioning/limitations-and-fees`.
///
/// Records are kept as raw JSON objects; the comparison works on their
/// string renderings rather than on a fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitationsAndFees {
    pub trading_fee_rate: Vec<Value>,
    pub order_fees_and_limitations: Vec<Value>,
    pub restrictions_of_withdrawal_fees: Vec<Value>,
}

impl LimitationsAndFees {
    /// VIP tiers: `rank`, `twdVolumeSymbol`, `twdVolume`, `makerFee`, `takerFee`, ...
    #[must_use]
    pub fn trading_fee_table(&self) -> RawTable {
        RawTable::from_records(&self.trading_fee_rate)
    }

    /// Per-pair limits: `pair`, `minimumOrderAmount`, `minimumOrderAmountBase`, ...
    #[must_use]
    pub fn order_limits_table(&self) -> RawTable {
        RawTable::from_records(&self.order_fees_and_limitations)
    }

    #[must_use]
    pub fn withdrawal_fees_table(&self) -> RawTable {
        RawTable::from_records(&self.restrictions_of_withdrawal_fees)
    }
}
