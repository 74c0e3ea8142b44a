//! Retrieval outcome statistics.
//!
//! Purely observational: call sites record each retrieval's outcome and the
//! wait time on success, and [`OtpStats::report`] derives a point-in-time
//! success rate and mean wait. Recording never influences control flow.
//!
//! # Example
//!
//! ```
//! use otp_sync::OtpStats;
//! use std::time::Duration;
//!
//! let stats = OtpStats::new();
//! stats.record_success(Duration::from_secs(4));
//! stats.record_failure();
//!
//! let report = stats.report();
//! assert_eq!(report.total_requests, 2);
//! assert_eq!(report.success_rate, 50.0);
//! assert_eq!(report.average_wait, Duration::from_secs(4));
//! ```

use once_cell::sync::Lazy;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

static GLOBAL: Lazy<OtpStats> = Lazy::new(OtpStats::new);

/// Cumulative retrieval counters.
///
/// Each record call is one self-contained, mutex-guarded update, so
/// concurrent attempts can record freely. Counters grow monotonically and
/// reset only with the process.
#[derive(Debug, Default)]
pub struct OtpStats {
    inner: Mutex<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    successful: u64,
    failed: u64,
    wait_times: Vec<Duration>,
}

impl OtpStats {
    /// Creates a zeroed tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lazily-initialized process-wide tracker.
    #[must_use]
    pub fn global() -> &'static OtpStats {
        &GLOBAL
    }

    /// Records a successful retrieval and how long it waited.
    pub fn record_success(&self, waited: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.successful += 1;
        inner.wait_times.push(waited);
    }

    /// Records a failed (timed-out) retrieval.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.failed += 1;
    }

    /// Returns a point-in-time snapshot with derived rates.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let total_requests = inner.successful + inner.failed;
        let success_rate = if total_requests == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                inner.successful as f64 / total_requests as f64 * 100.0
            }
        };

        let average_wait = if inner.wait_times.is_empty() {
            Duration::ZERO
        } else {
            inner.wait_times.iter().sum::<Duration>() / inner.wait_times.len() as u32
        };

        StatsReport {
            total_requests,
            successful: inner.successful,
            failed: inner.failed,
            success_rate,
            average_wait,
        }
    }
}

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    /// Every retrieval recorded so far.
    pub total_requests: u64,
    /// Retrievals that found a code.
    pub successful: u64,
    /// Retrievals that timed out.
    pub failed: u64,
    /// Success percentage over all requests (0 when none).
    pub success_rate: f64,
    /// Mean wait over successful retrievals only (zero when none).
    pub average_wait: Duration,
}

impl std::fmt::Display for StatsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests, {} succeeded ({:.1}%), avg wait {:.1}s",
            self.total_requests,
            self.successful,
            self.success_rate,
            self.average_wait.as_secs_f64()
        )
    }
}
