//! Functional cases for `GET /trading-history/{pair}`.
//!
//! Negative cases expect the server to reject the request; the client never
//! validates inputs itself, so every probe reaches the server as written.

use crate::case::{Attachment, CaseOutcome, CaseRun};
use crate::fixtures::{
    leaked_keyword, INT64_EDGE_CASES, INVALID_PAIR, INVALID_RESOLUTION, REVERSED_RANGE,
    SQL_INJECTION_PAYLOADS,
};
use bito_qa_bitopro::{BitoProClient, BitoProError, OhlcQuery, RESOLUTIONS};
use bito_qa_core::SuiteConfig;
use chrono::DateTime;
use serde_json::Value;

const CANDLE_FIELDS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Runs the OHLC cases against one client with the configured defaults.
#[derive(Debug, Clone)]
pub struct OhlcSuite {
    pub(crate) client: BitoProClient,
    pub(crate) config: SuiteConfig,
}

impl OhlcSuite {
    #[must_use]
    pub fn new(client: BitoProClient, config: SuiteConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Runs every case in order. Cases are independent; one failing never skips another.
    pub async fn run(&self) -> Vec<CaseOutcome> {
        vec![
            self.valid_params().await,
            self.invalid_pair().await,
            self.invalid_resolution().await,
            self.invalid_time_range().await,
            self.all_resolutions().await,
            self.int64_edge_cases().await,
            self.sql_injection().await,
            self.required_params().await,
            self.response_time().await,
            self.concurrent_performance().await,
        ]
    }

    pub(crate) fn default_query(&self) -> OhlcQuery {
        OhlcQuery::new(
            self.config.pair.as_str(),
            self.config.resolution.as_str(),
            self.config.from_timestamp,
            self.config.to_timestamp,
        )
    }

    // =========================================================================
    // Positive
    // =========================================================================

    /// Default parameters return a well-formed candle list.
    pub async fn valid_params(&self) -> CaseOutcome {
        let mut run = CaseRun::start("valid_params");

        match self.client.get_ohlc(&self.default_query()).await {
            Ok((body, record)) => {
                run.attach_record("valid params", &record);
                match validate_ohlc_body(&body) {
                    Ok(summary) => {
                        if let Some(sample) = summary.sample {
                            run.attach(Attachment::json(
                                format!("OHLC sample ({})", summary.sample_time),
                                &sample,
                            ));
                        }
                    }
                    Err(message) => run.fail(message),
                }
                run.finish()
            }
            Err(e) => {
                run.attach_error("valid params", &e);
                run.broken(e.to_string())
            }
        }
    }

    /// Every documented resolution returns a well-formed body.
    pub async fn all_resolutions(&self) -> CaseOutcome {
        let mut run = CaseRun::start("all_resolutions");

        for resolution in RESOLUTIONS {
            let mut query = self.default_query();
            query.resolution = resolution.to_string();
            let label = format!("resolution {resolution}");

            match self.client.get_ohlc(&query).await {
                Ok((body, record)) => {
                    run.attach_record(&label, &record);
                    match validate_ohlc_body(&body) {
                        Ok(summary) => {
                            run.attach(Attachment::text(
                                format!("{label} data points"),
                                format!("Data points: {}", summary.count),
                            ));
                            if let Some(sample) = summary.sample {
                                run.attach(Attachment::json(
                                    format!("{label} first candle ({})", summary.sample_time),
                                    &sample,
                                ));
                            }
                        }
                        Err(message) => run.fail(format!("{label}: {message}")),
                    }
                }
                Err(e) => {
                    run.attach_error(&label, &e);
                    run.fail(format!("{label}: {e}"));
                }
            }
        }

        run.finish()
    }

    // =========================================================================
    // Negative
    // =========================================================================

    pub async fn invalid_pair(&self) -> CaseOutcome {
        let mut query = self.default_query();
        query.pair = INVALID_PAIR.to_string();
        self.expect_rejections("invalid_pair", vec![("invalid pair".to_string(), query)])
            .await
    }

    pub async fn invalid_resolution(&self) -> CaseOutcome {
        let mut query = self.default_query();
        query.resolution = INVALID_RESOLUTION.to_string();
        self.expect_rejections(
            "invalid_resolution",
            vec![("invalid resolution".to_string(), query)],
        )
        .await
    }

    /// `from` later than `to`.
    pub async fn invalid_time_range(&self) -> CaseOutcome {
        let (from, to) = REVERSED_RANGE;
        let query = OhlcQuery::new(
            self.config.pair.as_str(),
            self.config.resolution.as_str(),
            from,
            to,
        );
        self.expect_rejections(
            "invalid_time_range",
            vec![("reversed time range".to_string(), query)],
        )
        .await
    }

    /// Each required parameter left empty or absent in turn.
    pub async fn required_params(&self) -> CaseOutcome {
        let base = self.default_query();
        let probes = vec![
            (
                "missing pair".to_string(),
                OhlcQuery {
                    pair: String::new(),
                    ..base.clone()
                },
            ),
            (
                "missing resolution".to_string(),
                OhlcQuery {
                    resolution: String::new(),
                    ..base.clone()
                },
            ),
            (
                "missing from".to_string(),
                OhlcQuery {
                    from: None,
                    ..base.clone()
                },
            ),
            ("missing to".to_string(), OhlcQuery { to: None, ..base }),
        ];
        self.expect_rejections("required_params", probes).await
    }

    /// Sends each probe and expects an API error.
    ///
    /// A success response fails the case. A transport error breaks it, since
    /// the server's validation was never exercised.
    async fn expect_rejections(&self, name: &str, probes: Vec<(String, OhlcQuery)>) -> CaseOutcome {
        let mut run = CaseRun::start(name);

        for (label, query) in probes {
            match self.client.get_ohlc(&query).await {
                Ok((body, record)) => {
                    run.attach_record(&label, &record);
                    run.fail(format!("{label}: expected a rejection, got data: {body}"));
                }
                Err(e @ BitoProError::Api { .. }) => run.attach_error(&label, &e),
                Err(e) => {
                    run.attach_error(&label, &e);
                    return run.broken(format!("{label}: {e}"));
                }
            }
        }

        run.finish()
    }

    // =========================================================================
    // Edge cases and security
    // =========================================================================

    /// `from` at and beyond the int64 bounds. Outcomes are recorded, not asserted.
    pub async fn int64_edge_cases(&self) -> CaseOutcome {
        let mut run = CaseRun::start("int64_edge_cases");

        for (case, value) in INT64_EDGE_CASES {
            let query = OhlcQuery {
                from: Some(value),
                ..self.default_query()
            };
            let label = format!("from = {value} ({case})");

            match self.client.get_ohlc(&query).await {
                Ok((body, record)) => {
                    run.attach_record(&label, &record);
                    run.attach(Attachment::text(
                        format!("{label} response summary"),
                        format!("Data points: {}", data_count(&body)),
                    ));
                }
                Err(e) => run.attach_error(&label, &e),
            }
        }

        run.finish()
    }

    /// Injection payloads in the pair segment must not leak database details.
    pub async fn sql_injection(&self) -> CaseOutcome {
        let mut run = CaseRun::start("sql_injection");

        for payload in SQL_INJECTION_PAYLOADS {
            let query = OhlcQuery {
                pair: payload.to_string(),
                ..self.default_query()
            };
            let label = format!("payload {payload:?}");

            match self.client.get_ohlc(&query).await {
                Ok((body, record)) => {
                    run.attach_record(&label, &record);
                    run.attach(Attachment::text(
                        format!("{label} response summary"),
                        format!("Data points: {}", data_count(&body)),
                    ));
                }
                Err(e) => {
                    run.attach_error(&label, &e);
                    let text = error_text(&e).replace(payload, "");
                    if let Some(keyword) = leaked_keyword(&text) {
                        run.fail(format!("{label}: error response mentions {keyword:?}: {e}"));
                    }
                }
            }
        }

        run.finish()
    }
}

/// Shape of a valid OHLC body.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcBodySummary {
    pub count: usize,
    /// First candle, if any.
    pub sample: Option<Value>,
    /// First candle's timestamp as a UTC date, empty without a sample.
    pub sample_time: String,
}

/// Checks that `body` is an object whose `data` list holds candles with all six fields.
///
/// Only the first candle is inspected.
///
/// # Errors
/// Returns a message naming the first violated expectation.
pub fn validate_ohlc_body(body: &Value) -> Result<OhlcBodySummary, String> {
    let object = body
        .as_object()
        .ok_or_else(|| format!("response should be an object, got {body}"))?;
    let data = object
        .get("data")
        .ok_or_else(|| "response should contain a 'data' field".to_string())?
        .as_array()
        .ok_or_else(|| "'data' should be a list".to_string())?;

    let Some(first) = data.first() else {
        return Ok(OhlcBodySummary {
            count: 0,
            sample: None,
            sample_time: String::new(),
        });
    };

    for field in CANDLE_FIELDS {
        if first.get(field).is_none() {
            return Err(format!("OHLC candle should contain a '{field}' field"));
        }
    }

    let sample_time = first
        .get("timestamp")
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    Ok(OhlcBodySummary {
        count: data.len(),
        sample: Some(first.clone()),
        sample_time,
    })
}

pub(crate) fn data_count(body: &Value) -> usize {
    body.get("data").and_then(Value::as_array).map_or(0, Vec::len)
}

/// Message plus body of an error, the text a client would get to see.
fn error_text(error: &BitoProError) -> String {
    match error.body() {
        Some(body) => format!("{error} {body}"),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseStatus;
    use bito_qa_core::ExchangeConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn candles() -> Value {
        json!({"data": [{
            "timestamp": 1_609_459_200_000_i64,
            "open": "900000", "high": "910000", "low": "890000",
            "close": "905000", "volume": "12.5"
        }]})
    }

    fn suite(server: &MockServer) -> OhlcSuite {
        let client = BitoProClient::new(&ExchangeConfig::default())
            .expect("client")
            .with_base_url(server.uri());
        OhlcSuite::new(client, SuiteConfig::default())
    }

    #[test]
    fn test_validate_body() {
        let summary = validate_ohlc_body(&candles()).expect("valid");
        assert_eq!(summary.count, 1);
        assert_eq!(summary.sample_time, "2021-01-01 00:00:00");

        assert!(validate_ohlc_body(&json!({"data": []})).is_ok());
        assert!(validate_ohlc_body(&json!([1, 2])).is_err());
        assert!(validate_ohlc_body(&json!({"data": {}})).is_err());
        let err = validate_ohlc_body(&json!({"data": [{"timestamp": 1, "open": "1"}]}))
            .expect_err("missing fields");
        assert!(err.contains("high"));
    }

    #[tokio::test]
    async fn test_valid_params_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trading-history/btc_twd"))
            .and(query_param("resolution", "1h"))
            .and(query_param("from", "1609459200"))
            .and(query_param("to", "1609545600"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candles()))
            .mount(&server)
            .await;

        let outcome = suite(&server).valid_params().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        assert!(outcome.attachment("valid params request").is_some());
        assert!(outcome
            .attachment("OHLC sample (2021-01-01 00:00:00)")
            .is_some());
    }

    #[tokio::test]
    async fn test_valid_params_malformed_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candles": []})))
            .mount(&server)
            .await;

        let outcome = suite(&server).valid_params().await;
        assert_eq!(outcome.status, CaseStatus::Failed);
    }

    #[tokio::test]
    async fn test_valid_params_transport_error_is_broken() {
        let client = BitoProClient::new(&ExchangeConfig::default())
            .expect("client")
            .with_base_url("http://127.0.0.1:1");
        let outcome = OhlcSuite::new(client, SuiteConfig::default())
            .valid_params()
            .await;

        assert_eq!(outcome.status, CaseStatus::Broken);
    }

    #[tokio::test]
    async fn test_rejected_invalid_pair_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trading-history/invalid_pair"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "pair not found"})),
            )
            .mount(&server)
            .await;

        let outcome = suite(&server).invalid_pair().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        let response = outcome
            .attachment("invalid pair error response")
            .expect("error captured");
        assert!(response.body.contains("pair not found"));
    }

    #[tokio::test]
    async fn test_accepted_invalid_resolution_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let outcome = suite(&server).invalid_resolution().await;

        assert_eq!(outcome.status, CaseStatus::Failed);
        assert!(outcome
            .message
            .as_deref()
            .is_some_and(|m| m.contains("expected a rejection")));
    }

    #[tokio::test]
    async fn test_required_params_sends_each_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("missing parameter"))
            .expect(4)
            .mount(&server)
            .await;

        let outcome = suite(&server).required_params().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        for label in ["missing pair", "missing resolution", "missing from", "missing to"] {
            assert!(outcome.attachment(&format!("{label} error")).is_some());
        }
        let requests = server.received_requests().await.expect("recording enabled");
        assert!(requests
            .iter()
            .any(|r| !r.url.query_pairs().any(|(k, _)| k == "from")));
    }

    #[tokio::test]
    async fn test_all_resolutions_records_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("resolution", "1M"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candles()))
            .mount(&server)
            .await;

        let outcome = suite(&server).all_resolutions().await;

        assert_eq!(outcome.status, CaseStatus::Failed);
        assert!(outcome
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("resolution 1M")));
        assert!(outcome.attachment("resolution 1d data points").is_some());
    }

    #[tokio::test]
    async fn test_int64_edge_cases_only_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("from", "9223372036854775808"))
            .respond_with(ResponseTemplate::new(400).set_body_string("out of range"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let outcome = suite(&server).int64_edge_cases().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        assert!(outcome
            .attachment("from = 9223372036854775808 (overflow) error")
            .is_some());
        assert!(outcome
            .attachment("from = 0 (zero) response summary")
            .is_some());
    }

    #[tokio::test]
    async fn test_sql_injection_leak_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string("ERROR: syntax error at or near \"OR\""),
            )
            .mount(&server)
            .await;

        let outcome = suite(&server).sql_injection().await;

        assert_eq!(outcome.status, CaseStatus::Failed);
        assert!(outcome
            .message
            .as_deref()
            .is_some_and(|m| m.contains("syntax")));
    }

    /// Answers 400 with the decoded pair echoed back.
    struct EchoPair;

    impl Respond for EchoPair {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let segment = request
                .url
                .path_segments()
                .and_then(|mut s| s.next_back())
                .unwrap_or_default();
            let pair = urlencoding::decode(segment).unwrap_or_default();
            ResponseTemplate::new(400).set_body_string(format!("unknown pair {pair}"))
        }
    }

    #[tokio::test]
    async fn test_sql_injection_echoed_payload_is_not_a_leak() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(EchoPair)
            .expect(10)
            .mount(&server)
            .await;

        let outcome = suite(&server).sql_injection().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        let error = outcome
            .attachment("payload \"'; DROP TABLE users; --\" error")
            .expect("error attached");
        assert!(error.body.contains("DROP TABLE"));
    }
}
