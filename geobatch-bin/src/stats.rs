use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    time::Duration,
};

use geobatch_lib::Report;
use serde::Serialize;

/// Number of error messages listed in the summary
const MAX_COMMON_ERRORS: usize = 5;

/// How often an error message occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ErrorCount {
    pub(crate) error: String,
    pub(crate) count: usize,
}

/// Aggregated outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ValidationSummary {
    /// Rows in the output
    pub(crate) total_addresses: usize,
    pub(crate) valid_addresses: usize,
    pub(crate) invalid_addresses: usize,
    /// Percentage of valid rows, rounded to two decimals
    pub(crate) validation_rate: f64,
    /// Most frequent error messages, most frequent first
    pub(crate) common_errors: Vec<ErrorCount>,
    pub(crate) confidence_breakdown: BTreeMap<String, usize>,
    pub(crate) status_breakdown: BTreeMap<String, usize>,
    /// Rows of the input file
    pub(crate) input_rows: usize,
    pub(crate) unmatched_input_rows: usize,
    pub(crate) unmatched_results: usize,
    #[serde(with = "humantime_serde")]
    pub(crate) duration: Duration,
    pub(crate) output: Option<PathBuf>,
}

impl ValidationSummary {
    pub(crate) fn from_report(report: &Report) -> Self {
        let total = report.rows.len();
        let valid = report.valid_count();

        let mut errors: HashMap<String, usize> = HashMap::new();
        let mut confidence_breakdown = BTreeMap::new();
        let mut status_breakdown = BTreeMap::new();
        for row in &report.rows {
            if let Some(error) = row.verdict.error_summary() {
                *errors.entry(error).or_default() += 1;
            }
            *confidence_breakdown
                .entry(row.verdict.confidence.to_string())
                .or_default() += 1;
            *status_breakdown
                .entry(row.result.status.to_string())
                .or_default() += 1;
        }

        let mut common_errors: Vec<ErrorCount> = errors
            .into_iter()
            .map(|(error, count)| ErrorCount { error, count })
            .collect();
        // Ties are broken alphabetically to keep the output stable
        common_errors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error.cmp(&b.error)));
        common_errors.truncate(MAX_COMMON_ERRORS);

        Self {
            total_addresses: total,
            valid_addresses: valid,
            invalid_addresses: total - valid,
            validation_rate: validation_rate(valid, total),
            common_errors,
            confidence_breakdown,
            status_breakdown,
            input_rows: report.total,
            unmatched_input_rows: report.unmatched_original.len(),
            unmatched_results: report.unmatched_results.len(),
            duration: report.duration,
            output: report.output.clone(),
        }
    }

    /// Returns `true` if every row was resolved and judged valid
    pub(crate) const fn is_success(&self) -> bool {
        self.invalid_addresses == 0
            && self.unmatched_input_rows == 0
            && self.unmatched_results == 0
    }
}

#[allow(clippy::cast_precision_loss)]
fn validation_rate(valid: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = valid as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
