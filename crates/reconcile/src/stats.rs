use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Check counters for one reconciliation run.
///
/// Each atomic comparison is one unit: a row-count check, or one field flag
/// of one row. `total == passed + failed` holds after every update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    total_checks: u64,
    passed_checks: u64,
    failed_checks: u64,
}

impl RunStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one check with the given verdict.
    pub fn record(&mut self, passed: bool) {
        self.total_checks += 1;
        if passed {
            self.passed_checks += 1;
        } else {
            self.failed_checks += 1;
        }
    }

    /// Records one failed check for a comparison that could not be performed.
    pub fn record_failure(&mut self) {
        self.record(false);
    }

    #[must_use]
    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    #[must_use]
    pub fn passed_checks(&self) -> u64 {
        self.passed_checks
    }

    #[must_use]
    pub fn failed_checks(&self) -> u64 {
        self.failed_checks
    }

    /// Percentage of passed checks, 0 when nothing was checked.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        percent(self.passed_checks, self.total_checks)
    }

    /// Percentage of failed checks, 0 when nothing was checked.
    #[must_use]
    pub fn fail_rate(&self) -> f64 {
        percent(self.failed_checks, self.total_checks)
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = part as f64 / total as f64 * 100.0;
        rate
    }
}

impl Add for RunStatistics {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total_checks: self.total_checks + other.total_checks,
            passed_checks: self.passed_checks + other.passed_checks,
            failed_checks: self.failed_checks + other.failed_checks,
        }
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
