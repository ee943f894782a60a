mod compact;
mod json;

pub(crate) use compact::Compact;
pub(crate) use json::Json;

use crate::stats::ValidationSummary;
use anyhow::Result;

pub(crate) trait StatsFormatter {
    /// Format the summary of a run
    fn format(&self, summary: &ValidationSummary) -> Result<String>;
}
