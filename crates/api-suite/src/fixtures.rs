//! Probe inputs for the negative, edge-case and security cases.

pub const INVALID_PAIR: &str = "invalid_pair";
pub const INVALID_RESOLUTION: &str = "invalid_resolution";

/// `from` later than `to`: 2021-01-02 00:00:00 UTC .. 2021-01-01 00:00:00 UTC.
pub const REVERSED_RANGE: (i64, i64) = (1_609_545_600, 1_609_459_200);

/// `from` values around and beyond the int64 range.
pub const INT64_EDGE_CASES: [(&str, i128); 7] = [
    ("min", i64::MIN as i128),
    ("max", i64::MAX as i128),
    ("overflow", i64::MAX as i128 + 1),
    ("underflow", i64::MIN as i128 - 1),
    ("zero", 0),
    ("negative", -1),
    ("positive", 1),
];

pub const SQL_INJECTION_PAYLOADS: [&str; 10] = [
    "' OR '1'='1",
    "'; DROP TABLE users; --",
    "' UNION SELECT * FROM information_schema.tables; --",
    "' OR '1'='1' --",
    "admin' --",
    "1' OR '1' = '1",
    "1 OR 1=1",
    "' OR 1=1 --",
    "' OR 'a'='a",
    "') OR ('a'='a",
];

/// Words that should never appear in an error returned for an injection probe.
pub const SENSITIVE_KEYWORDS: [&str; 9] = [
    "SQL", "syntax", "database", "query", "select", "insert", "update", "delete", "drop",
];

/// First sensitive keyword found in `text`, case-insensitively.
#[must_use]
pub fn leaked_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    SENSITIVE_KEYWORDS
        .iter()
        .find(|k| lower.contains(&k.to_lowercase()))
        .copied()
}
