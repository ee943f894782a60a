use anyhow::{Context, Result};

use super::StatsFormatter;
use crate::stats::ValidationSummary;

pub(crate) struct Json;

impl Json {
    pub(crate) const fn new() -> Self {
        Self {}
    }
}

impl StatsFormatter for Json {
    /// Format the summary as JSON object
    fn format(&self, summary: &ValidationSummary) -> Result<String> {
        serde_json::to_string_pretty(summary).context("Cannot format summary as JSON")
    }
}
