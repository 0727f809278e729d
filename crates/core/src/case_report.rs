#![allow(clippy::format_push_string)]

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use serde_json::{json, Value};

/// Column order of the results spreadsheet.
pub const SHEET_HEADERS: [&str; 17] = [
    "Platform",
    "CaseName",
    "Fail",
    "Fail%",
    "Broken",
    "Broken%",
    "Skip",
    "Skip%",
    "Pass",
    "Pass%",
    "Known",
    "Known%",
    "Total",
    "Link",
    "StartTime",
    "RunTime",
    "EndTime",
];

/// Zero-based index of the `RunTime` column in [`SHEET_HEADERS`].
pub const RUN_TIME_COLUMN: usize = 15;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Raw outcome counts of one test execution.
///
/// `broken` is a subset of `fail` and is not added into the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaseCounts {
    pub fail: u64,
    pub broken: u64,
    pub skip: u64,
    pub pass: u64,
    pub known: u64,
}

/// Summary of one test execution, ready for the spreadsheet and chat sinks.
///
/// Total and percentages are fixed at construction.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    platform: String,
    case_name: String,
    counts: CaseCounts,
    link: String,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    total: u64,
    fail_percent: f64,
    broken_percent: f64,
    skip_percent: f64,
    pass_percent: f64,
    known_percent: f64,
}

impl CaseReport {
    #[must_use]
    pub fn new(
        platform: impl Into<String>,
        case_name: impl Into<String>,
        counts: CaseCounts,
        link: impl Into<String>,
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
    ) -> Self {
        let total = counts.pass + counts.fail + counts.skip + counts.known;
        let percent = |n: u64| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };

        Self {
            platform: platform.into(),
            case_name: case_name.into(),
            link: link.into(),
            start_time,
            end_time,
            total,
            fail_percent: percent(counts.fail),
            broken_percent: percent(counts.broken),
            skip_percent: percent(counts.skip),
            pass_percent: percent(counts.pass),
            known_percent: percent(counts.known),
            counts,
        }
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    #[must_use]
    pub fn case_name(&self) -> &str {
        &self.case_name
    }

    #[must_use]
    pub fn counts(&self) -> CaseCounts {
        self.counts
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn fail_percent(&self) -> f64 {
        self.fail_percent
    }

    #[must_use]
    pub fn pass_percent(&self) -> f64 {
        self.pass_percent
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    /// Elapsed time between start and end, never negative.
    #[must_use]
    pub fn run_time(&self) -> Duration {
        let elapsed = self.end_time - self.start_time;
        if elapsed < Duration::zero() {
            Duration::zero()
        } else {
            elapsed
        }
    }

    /// Run time as a fraction of a day, the unit spreadsheets use for durations.
    #[must_use]
    pub fn run_time_days(&self) -> f64 {
        let micros = self.run_time().num_microseconds().unwrap_or(i64::MAX);
        micros as f64 / 1_000_000.0 / SECONDS_PER_DAY
    }

    /// One spreadsheet row in [`SHEET_HEADERS`] order.
    #[must_use]
    pub fn sheet_row(&self) -> Vec<Value> {
        vec![
            json!(self.platform),
            json!(self.case_name),
            json!(self.counts.fail),
            json!(format_percent(self.fail_percent)),
            json!(self.counts.broken),
            json!(format_percent(self.broken_percent)),
            json!(self.counts.skip),
            json!(format_percent(self.skip_percent)),
            json!(self.counts.pass),
            json!(format_percent(self.pass_percent)),
            json!(self.counts.known),
            json!(format_percent(self.known_percent)),
            json!(self.total),
            json!(self.link),
            json!(format_timestamp(&self.start_time)),
            json!(self.run_time_days()),
            json!(format_timestamp(&self.end_time)),
        ]
    }

    /// Multi-line chat summary.
    #[must_use]
    pub fn chat_message(&self) -> String {
        let mut message = String::new();
        message.push_str(&format!("【{}】\n", self.platform));
        message.push_str(&format!(
            "Case: {} / Report: {}\n",
            self.case_name, self.link
        ));
        message.push_str(&format!(
            "Failed: {} / Broken: {} / Skip: {} / Pass: {} / Total: {}\n",
            self.counts.fail, self.counts.broken, self.counts.skip, self.counts.pass, self.total
        ));
        message.push_str(&format!(
            "Start: {} / Run time: {} / End: {}",
            format_timestamp(&self.start_time),
            format_run_time(self.run_time()),
            format_timestamp(&self.end_time)
        ));
        message
    }
}

fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Formats a duration as `H:MM:SS`, with `.ffffff` appended when there are sub-second parts.
#[must_use]
pub fn format_run_time(duration: Duration) -> String {
    let total_micros = duration.num_microseconds().unwrap_or(i64::MAX).max(0);
    let micros = total_micros % 1_000_000;
    let total_seconds = total_micros / 1_000_000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if micros == 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 11, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    fn sample(counts: CaseCounts) -> CaseReport {
        CaseReport::new(
            "Production",
            "API_TEST_public/get_ohlc_data",
            counts,
            "http://localhost:8000/report.html",
            at(10, 0, 0),
            at(10, 2, 30),
        )
    }

    #[test]
    fn test_total_excludes_broken() {
        let report = sample(CaseCounts {
            fail: 2,
            broken: 1,
            skip: 1,
            pass: 6,
            known: 0,
        });
        assert_eq!(report.total(), 9);
        assert!((report.pass_percent() - 66.666_666).abs() < 0.001);
    }

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let report = sample(CaseCounts::default());
        assert_eq!(report.total(), 0);
        assert_eq!(report.fail_percent(), 0.0);
        let row = report.sheet_row();
        assert_eq!(row[3], json!("0.00%"));
    }

    #[test]
    fn test_sheet_row_matches_header_order() {
        let report = sample(CaseCounts {
            fail: 1,
            broken: 0,
            skip: 0,
            pass: 3,
            known: 0,
        });
        let row = report.sheet_row();

        assert_eq!(row.len(), SHEET_HEADERS.len());
        assert_eq!(SHEET_HEADERS[RUN_TIME_COLUMN], "RunTime");
        assert_eq!(row[0], json!("Production"));
        assert_eq!(row[2], json!(1));
        assert_eq!(row[3], json!("25.00%"));
        assert_eq!(row[9], json!("75.00%"));
        assert_eq!(row[12], json!(4));
        assert_eq!(row[14], json!("2025-03-11 10:00:00.000000"));

        let days = row[RUN_TIME_COLUMN].as_f64().expect("numeric run time");
        assert!((days - 150.0 / 86_400.0).abs() < 1e-12);
    }

    #[test]
    fn test_chat_message_lines() {
        let report = sample(CaseCounts {
            fail: 2,
            broken: 1,
            skip: 1,
            pass: 6,
            known: 0,
        });
        let message = report.chat_message();
        let lines: Vec<&str> = message.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "【Production】");
        assert_eq!(
            lines[1],
            "Case: API_TEST_public/get_ohlc_data / Report: http://localhost:8000/report.html"
        );
        assert_eq!(lines[2], "Failed: 2 / Broken: 1 / Skip: 1 / Pass: 6 / Total: 9");
        assert!(lines[3].contains("Run time: 0:02:30"));
    }

    #[test]
    fn test_format_run_time() {
        assert_eq!(format_run_time(Duration::seconds(3_725)), "1:02:05");
        assert_eq!(format_run_time(Duration::microseconds(4)), "0:00:00.000004");
        assert_eq!(format_run_time(Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_run_time_never_negative() {
        let report = CaseReport::new(
            "Production",
            "case",
            CaseCounts::default(),
            "",
            at(10, 0, 5),
            at(10, 0, 0),
        );
        assert_eq!(report.run_time(), Duration::zero());
    }
}
