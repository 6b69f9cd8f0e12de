use super::progress::format_bytes;
use crate::checksum::ChecksumAlgorithm;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Direction of a transfer run, used in report wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Upload,
    Download,
}

impl TransferDirection {
    pub fn past_tense(&self) -> &'static str {
        match self {
            TransferDirection::Upload => "uploaded",
            TransferDirection::Download => "downloaded",
        }
    }
}

/// Why a unit was not transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A copy exists and existence alone was enough
    Exists,
    /// A copy exists and its digest matches
    ChecksumMatch(ChecksumAlgorithm),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists => f.write_str("file exists"),
            SkipReason::ChecksumMatch(alg) => write!(f, "{} match", alg.as_str().to_uppercase()),
        }
    }
}

/// Result for one transfer unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Uploaded { path: String, bytes: u64 },
    Downloaded { path: String, bytes: u64 },
    Skipped { path: String, reason: SkipReason },
    Failed { path: String, error: String },
}

impl TransferOutcome {
    pub fn path(&self) -> &str {
        match self {
            TransferOutcome::Uploaded { path, .. }
            | TransferOutcome::Downloaded { path, .. }
            | TransferOutcome::Skipped { path, .. }
            | TransferOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TransferOutcome::Failed { .. })
    }
}

/// Aggregated counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub failed: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    /// Units that were attempted; `deleted` is counted separately.
    pub fn total_attempted(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// The one-line report printed at the end of a run.
    pub fn report_line(&self, direction: TransferDirection) -> String {
        let secs = self.elapsed.as_secs_f64();
        let speed = if secs > 0.0 {
            format_bytes((self.bytes as f64 / secs) as u64)
        } else {
            format_bytes(self.bytes)
        };
        format!(
            "Files {}: {}, skipped: {}, deleted: {}, failed: {} ({} in {:.1}s, {}/s)",
            direction.past_tense(),
            self.succeeded,
            self.skipped,
            self.deleted,
            self.failed,
            format_bytes(self.bytes),
            secs,
            speed
        )
    }
}

/// Thread-safe collector of per-unit outcomes
pub struct TransferTracker {
    started: Instant,
    outcomes: Mutex<Vec<TransferOutcome>>,
    deleted: Mutex<usize>,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            outcomes: Mutex::new(Vec::new()),
            deleted: Mutex::new(0),
        }
    }

    fn outcomes(&self) -> MutexGuard<'_, Vec<TransferOutcome>> {
        self.outcomes.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn record(&self, outcome: TransferOutcome) {
        self.outcomes().push(outcome);
    }

    pub fn add_deleted(&self, count: usize) {
        *self.deleted.lock().unwrap_or_else(|p| p.into_inner()) += count;
    }

    /// Snapshot of recorded outcomes in recording order.
    pub fn outcomes_snapshot(&self) -> Vec<TransferOutcome> {
        self.outcomes().clone()
    }

    pub fn summary(&self) -> TransferSummary {
        let mut summary = TransferSummary {
            deleted: *self.deleted.lock().unwrap_or_else(|p| p.into_inner()),
            elapsed: self.started.elapsed(),
            ..Default::default()
        };
        for outcome in self.outcomes().iter() {
            match outcome {
                TransferOutcome::Uploaded { bytes, .. } | TransferOutcome::Downloaded { bytes, .. } => {
                    summary.succeeded += 1;
                    summary.bytes += bytes;
                }
                TransferOutcome::Skipped { .. } => summary.skipped += 1,
                TransferOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Summary plus per-unit outcomes of a finished run
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    pub summary: TransferSummary,
    pub outcomes: Vec<TransferOutcome>,
}

impl TransferReport {
    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }

    /// Outcomes that failed, in recording order.
    pub fn failures(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

impl TransferTracker {
    /// Freeze the tracker into a report.
    pub fn report(&self) -> TransferReport {
        TransferReport {
            summary: self.summary(),
            outcomes: self.outcomes_snapshot(),
        }
    }
}

impl Default for TransferTracker {
    fn default() -> Self {
        Self::new()
    }
}
