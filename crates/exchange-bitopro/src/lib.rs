//! BitoPro integration for the QA harness.
//!
//! - [`BitoProClient`]: public REST API (OHLC history, limitations and fees)
//! - [`FeesPageSource`]: the same fee data as published on the fees web page
//! - [`ExchangeRecord`]: request/response capture attached to test results

pub mod client;
pub mod error;
pub mod fees_page;
pub mod record;
pub mod types;

pub use client::{BitoProClient, BITOPRO_API_URL};
pub use error::{BitoProError, ErrorBody, Result, UNREADABLE_BODY};
pub use fees_page::{
    parse_fees_page, FeesPageSource, FeesPageTables, FixtureFeesPage, HttpFeesPage,
};
pub use record::{ExchangeRecord, RequestRecord, ResponseRecord};
pub use types::{Candle, LimitationsAndFees, OhlcQuery, OhlcResponse, RESOLUTIONS};
