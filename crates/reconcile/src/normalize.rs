//! Canonical forms for fee, volume and amount text.
//!
//! The web page and the API agree on values but not on notation: percent vs
//! decimal fraction, thousands separators, currency suffixes and comparator
//! glyphs. These functions erase notation so equality means equal values.
//! None of them fail; unparseable input degrades to cleaned text.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]").expect("valid separator pattern"));

static CURRENCY_UNITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TWD|USD|BTC").expect("valid currency pattern"));

static AMOUNT_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.]+)\s*([A-Za-z]+)").expect("valid amount pattern"));

const COMPARATORS: [char; 2] = ['≥', '<'];

/// Fee fractions above this are taken to be written as percentages.
const PERCENT_SCALE_THRESHOLD: f64 = 0.01;

/// Normalized 30-day volume: a magnitude when the text parses, else the cleaned text.
///
/// A number never equals a text value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VolumeValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for VolumeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical fee text: each `/`-separated part as a decimal fraction with 6 places.
///
/// `"0.1% / 0.2%"` and `"0.001 / 0.002"` both become `"0.001000/0.002000"`.
/// Parts that are not numbers are kept as they are.
#[must_use]
pub fn normalize_fee(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .collect();

    stripped
        .split('/')
        .map(|part| match part.parse::<f64>() {
            Ok(value) => {
                let value = if value > PERCENT_SCALE_THRESHOLD {
                    value / 100.0
                } else {
                    value
                };
                format!("{value:.6}")
            }
            Err(_) => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Volume magnitude with separators, currency units and comparator glyphs removed.
///
/// Comparators are dropped, not interpreted: `"≥ 10"` and `"10"` are equal.
#[must_use]
pub fn normalize_volume(text: &str) -> VolumeValue {
    let cleaned = SEPARATORS.replace_all(text, "");
    let cleaned = CURRENCY_UNITS.replace_all(&cleaned, "");
    let cleaned = strip_comparators(&cleaned);

    match cleaned.parse::<f64>() {
        Ok(value) => VolumeValue::Number(value),
        Err(_) => VolumeValue::Text(cleaned),
    }
}

/// Amount as `"<number> <unit>"` when it has that shape, else the cleaned text.
///
/// `clean_amount("1,000 BTC") == "1000 BTC"`, `clean_amount("≥ 5 ETH") == "5 ETH"`.
#[must_use]
pub fn clean_amount(text: &str) -> String {
    let cleaned = SEPARATORS.replace_all(text, "");
    let cleaned = strip_comparators(&cleaned);

    match AMOUNT_WITH_UNIT.captures(&cleaned) {
        Some(caps) => format!("{} {}", &caps[1], &caps[2]),
        None => cleaned,
    }
}

fn strip_comparators(text: &str) -> String {
    text.chars().filter(|c| !COMPARATORS.contains(c)).collect()
}
