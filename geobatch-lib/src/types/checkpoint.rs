use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Progress snapshot emitted after every batch.
///
/// Each checkpoint supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchCheckpoint {
    /// Records handled so far, including skipped ones
    pub processed_count: usize,
    /// Records in the whole run
    pub total_count: usize,
    /// Zero-based index of the batch that just finished
    pub last_batch_index: usize,
    /// Wall-clock time since the run started
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    /// Projected time until all records are handled
    #[serde(with = "humantime_serde")]
    pub estimated_remaining: Option<Duration>,
    /// Where the partial output was persisted, if anywhere
    pub partial_output_path: Option<PathBuf>,
}

impl BatchCheckpoint {
    /// Create a checkpoint and derive the remaining time from the
    /// throughput observed so far.
    #[must_use]
    pub fn new(
        processed_count: usize,
        total_count: usize,
        last_batch_index: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            processed_count,
            total_count,
            last_batch_index,
            elapsed,
            estimated_remaining: estimate_remaining(processed_count, total_count, elapsed),
            partial_output_path: None,
        }
    }

    /// Record where the partial output was written
    #[must_use]
    pub fn with_partial_output(mut self, path: PathBuf) -> Self {
        self.partial_output_path = Some(path);
        self
    }

    /// Returns `true` once every record was handled
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.processed_count >= self.total_count
    }

    /// Share of handled records in percent
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_done(&self) -> f64 {
        if self.total_count == 0 {
            return 100.0;
        }
        self.processed_count as f64 / self.total_count as f64 * 100.0
    }
}

impl Display for BatchCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {}/{} records ({:.1}%) in {:.1?}",
            self.processed_count,
            self.total_count,
            self.percent_done(),
            self.elapsed
        )?;
        match self.estimated_remaining {
            Some(remaining) if !self.is_complete() => write!(f, ", about {remaining:.1?} left"),
            _ => Ok(()),
        }
    }
}

/// `(total - processed) / (processed / elapsed)`
///
/// Returns `None` as long as there is no throughput to extrapolate from.
#[allow(clippy::cast_precision_loss)]
fn estimate_remaining(processed: usize, total: usize, elapsed: Duration) -> Option<Duration> {
    let secs = elapsed.as_secs_f64();
    if processed == 0 || secs <= 0.0 {
        return None;
    }
    let rate = processed as f64 / secs;
    let remaining = total.saturating_sub(processed) as f64 / rate;
    Some(Duration::from_secs_f64(remaining))
}
