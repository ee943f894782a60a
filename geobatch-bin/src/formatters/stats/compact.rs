use anyhow::Result;
use std::fmt::{self, Display};

use crate::formatters::color::{BOLD_GREEN, BOLD_PINK, BOLD_YELLOW, DIM, NORMAL, YELLOW, color};
use crate::formatters::duration::Duration;
use crate::stats::ValidationSummary;

use super::StatsFormatter;

struct CompactSummary<'a>(&'a ValidationSummary);

impl Display for CompactSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;

        if !summary.common_errors.is_empty() {
            color!(f, BOLD_PINK, "Most common errors:\n",)?;
            for entry in &summary.common_errors {
                color!(f, YELLOW, "{:>6} ", entry.count)?;
                writeln!(f, "{}", entry.error)?;
            }
            writeln!(f)?;
        }

        if summary.unmatched_input_rows > 0 || summary.unmatched_results > 0 {
            color!(
                f,
                BOLD_YELLOW,
                "{} input rows and {} results could not be matched and are missing from the output\n\n",
                summary.unmatched_input_rows,
                summary.unmatched_results
            )?;
        }

        color!(f, NORMAL, "📍 {} Total", summary.total_addresses)?;
        color!(f, DIM, " (in {})", Duration::from(summary.duration))?;
        color!(f, BOLD_GREEN, " ✅ {} Valid", summary.valid_addresses)?;
        color!(f, BOLD_PINK, " 🚫 {} Invalid", summary.invalid_addresses)?;
        color!(f, NORMAL, " ({}% valid)", summary.validation_rate)?;

        if !summary.confidence_breakdown.is_empty() {
            let breakdown: Vec<String> = summary
                .confidence_breakdown
                .iter()
                .map(|(confidence, count)| format!("{confidence}: {count}"))
                .collect();
            color!(f, DIM, "\nConfidence: {}", breakdown.join(", "))?;
        }

        if let Some(output) = &summary.output {
            color!(f, DIM, "\nResults saved to {}", output.display())?;
        }

        Ok(())
    }
}

pub(crate) struct Compact;

impl Compact {
    pub(crate) const fn new() -> Self {
        Self {}
    }
}

impl StatsFormatter for Compact {
    fn format(&self, summary: &ValidationSummary) -> Result<String> {
        Ok(CompactSummary(summary).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::report;

    #[test]
    fn test_formatter() {
        console::set_colors_enabled(false);
        let summary = ValidationSummary::from_report(&report());
        let result = Compact::new().format(&summary).unwrap();

        assert!(result.contains("📍 6 Total (in 3s)"));
        assert!(result.contains("✅ 2 Valid"));
        assert!(result.contains("🚫 4 Invalid"));
        assert!(result.contains("(33.33% valid)"));
        assert!(result.contains("     2 ZERO_RESULTS"));
        assert!(result.contains("1 input rows and 0 results could not be matched"));
        assert!(result.contains("Confidence: HIGH: 2, UNKNOWN: 4"));
    }
}
