#![allow(clippy::format_push_string)]

//! Latency cases: sequential timing per resolution and concurrent bursts.

use crate::case::{Attachment, CaseOutcome, CaseRun};
use crate::ohlc::{data_count, OhlcSuite};
use bito_qa_bitopro::Result;
use std::time::{Duration, Instant};

/// One timed request of the response-time case.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    pub resolution: String,
    pub elapsed: Duration,
    pub data_count: usize,
}

/// One burst of the concurrency case.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstSample {
    pub concurrency: usize,
    pub total: Duration,
    pub average: Duration,
}

impl OhlcSuite {
    /// Times one request per configured resolution, sequentially.
    ///
    /// Any request error breaks the case; timings gathered so far stay attached.
    pub async fn response_time(&self) -> CaseOutcome {
        let mut run = CaseRun::start("response_time");
        let mut samples = Vec::with_capacity(self.config.timing_resolutions.len());

        for resolution in &self.config.timing_resolutions {
            let mut query = self.default_query();
            query.resolution.clone_from(resolution);
            let label = format!("resolution {resolution}");

            let started = Instant::now();
            let result = self.client.get_ohlc(&query).await;
            let elapsed = started.elapsed();

            match result {
                Ok((body, record)) => {
                    run.attach_record(&label, &record);
                    let sample = TimingSample {
                        resolution: resolution.clone(),
                        elapsed,
                        data_count: data_count(&body),
                    };
                    run.attach(Attachment::text(
                        format!("{label} response time"),
                        format!(
                            "Response time: {:.4} s\nData points: {}",
                            sample.elapsed.as_secs_f64(),
                            sample.data_count
                        ),
                    ));
                    tracing::debug!(resolution = %resolution, elapsed_ms = elapsed.as_millis(), "Timed request");
                    samples.push(sample);
                }
                Err(e) => {
                    run.attach_error(&label, &e);
                    run.attach(Attachment::text("Response times", timing_table(&samples)));
                    return run.broken(format!("{label}: {e}"));
                }
            }
        }

        run.attach(Attachment::text("Response times", timing_table(&samples)));
        run.finish()
    }

    /// Fires each configured number of identical requests at once.
    ///
    /// Every request of a burst runs to completion before the burst is judged;
    /// any error in it breaks the case.
    pub async fn concurrent_performance(&self) -> CaseOutcome {
        let mut run = CaseRun::start("concurrent_performance");
        let mut samples = Vec::with_capacity(self.config.concurrency_levels.len());
        let query = self.default_query();

        for &concurrency in &self.config.concurrency_levels {
            let label = format!("concurrency {concurrency}");
            let requests = (0..concurrency).map(|_| self.client.get_ohlc(&query));

            let started = Instant::now();
            let responses: Result<Vec<_>> = futures_util::future::join_all(requests)
                .await
                .into_iter()
                .collect();
            let total = started.elapsed();

            match responses {
                Ok(responses) => {
                    if let Some((_, record)) = responses.first() {
                        run.attach_record(&format!("{label} sample"), record);
                    }
                    let sample = burst_sample(concurrency, total);
                    run.attach(Attachment::text(
                        format!("{label} performance"),
                        format!(
                            "Total time: {:.4} s\nAverage time: {:.4} s",
                            sample.total.as_secs_f64(),
                            sample.average.as_secs_f64()
                        ),
                    ));
                    tracing::info!(
                        concurrency,
                        total_ms = total.as_millis(),
                        "Burst completed"
                    );
                    samples.push(sample);
                }
                Err(e) => {
                    run.attach_error(&label, &e);
                    run.attach(Attachment::text("Concurrency", burst_table(&samples)));
                    return run.broken(format!("{label}: {e}"));
                }
            }
        }

        run.attach(Attachment::text("Concurrency", burst_table(&samples)));
        run.finish()
    }
}

fn burst_sample(concurrency: usize, total: Duration) -> BurstSample {
    let average = u32::try_from(concurrency)
        .ok()
        .filter(|n| *n > 0)
        .map_or(Duration::ZERO, |n| total / n);
    BurstSample {
        concurrency,
        total,
        average,
    }
}

/// Markdown table of timings, fastest first.
#[must_use]
pub fn timing_table(samples: &[TimingSample]) -> String {
    let mut sorted: Vec<&TimingSample> = samples.iter().collect();
    sorted.sort_by_key(|s| s.elapsed);

    let mut out = String::from("Response time by resolution:\n\n");
    out.push_str("| Resolution | Response time (s) | Data points |\n");
    out.push_str("|------------|-------------------|-------------|\n");
    for s in sorted {
        out.push_str(&format!(
            "| {} | {:.4} | {} |\n",
            s.resolution,
            s.elapsed.as_secs_f64(),
            s.data_count
        ));
    }
    out
}

/// Markdown table of bursts in configured order.
#[must_use]
pub fn burst_table(samples: &[BurstSample]) -> String {
    let mut out = String::from("Concurrent performance:\n\n");
    out.push_str("| Concurrency | Total time (s) | Average time (s) |\n");
    out.push_str("|-------------|----------------|------------------|\n");
    for s in samples {
        out.push_str(&format!(
            "| {} | {:.4} | {:.4} |\n",
            s.concurrency,
            s.total.as_secs_f64(),
            s.average.as_secs_f64()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseStatus;
    use bito_qa_bitopro::BitoProClient;
    use bito_qa_core::{ExchangeConfig, SuiteConfig};
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn suite(server: &MockServer, config: SuiteConfig) -> OhlcSuite {
        let client = BitoProClient::new(&ExchangeConfig::default())
            .expect("client")
            .with_base_url(server.uri());
        OhlcSuite::new(client, config)
    }

    #[test]
    fn test_timing_table_sorted_by_latency() {
        let table = timing_table(&[
            TimingSample {
                resolution: "1m".to_string(),
                elapsed: Duration::from_millis(300),
                data_count: 1440,
            },
            TimingSample {
                resolution: "1d".to_string(),
                elapsed: Duration::from_millis(50),
                data_count: 1,
            },
        ]);

        let fast = table.find("| 1d | 0.0500 | 1 |").expect("1d row");
        let slow = table.find("| 1m | 0.3000 | 1440 |").expect("1m row");
        assert!(fast < slow);
    }

    #[test]
    fn test_burst_average() {
        let sample = burst_sample(4, Duration::from_millis(400));
        assert_eq!(sample.average, Duration::from_millis(100));
        assert_eq!(burst_sample(0, Duration::from_millis(5)).average, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_response_time_covers_configured_resolutions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(6)
            .mount(&server)
            .await;

        let outcome = suite(&server, SuiteConfig::default()).response_time().await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        let table = outcome.attachment("Response times").expect("table");
        for resolution in ["1m", "5m", "15m", "30m", "1h", "1d"] {
            assert!(table.body.contains(&format!("| {resolution} |")));
        }
    }

    #[tokio::test]
    async fn test_response_time_error_is_broken() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("resolution", "15m"))
            .respond_with(ResponseTemplate::new(503))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let outcome = suite(&server, SuiteConfig::default()).response_time().await;

        assert_eq!(outcome.status, CaseStatus::Broken);
        let table = outcome.attachment("Response times").expect("partial table");
        assert!(table.body.contains("| 5m |"));
        assert!(!table.body.contains("| 30m |"));
    }

    #[tokio::test]
    async fn test_concurrent_bursts_send_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1 + 5 + 10)
            .mount(&server)
            .await;

        let outcome = suite(&server, SuiteConfig::default())
            .concurrent_performance()
            .await;

        assert_eq!(outcome.status, CaseStatus::Passed);
        assert!(outcome.attachment("concurrency 10 performance").is_some());
        assert!(outcome.attachment("concurrency 5 sample request").is_some());
    }

    #[tokio::test]
    async fn test_failed_burst_still_completes_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let config = SuiteConfig {
            concurrency_levels: vec![3, 5],
            ..SuiteConfig::default()
        };
        let outcome = suite(&server, config).concurrent_performance().await;

        assert_eq!(outcome.status, CaseStatus::Broken);
        // the failing burst ran all three requests; the next burst never started
        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 3);
    }
}
