use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geobatch_lib::{Dataset, Pipeline};
use log::info;

use crate::ExitCode;
use crate::client;
use crate::formatters::get_stats_formatter;
use crate::options::Config;
use crate::progress::Progress;
use crate::stats::ValidationSummary;

/// Suffix of the default output file, appended to the input's file stem
const DEFAULT_OUTPUT_SUFFIX: &str = "_validated.csv";

/// Resolve every address of `dataset`, write the enriched rows and print a
/// summary.
///
/// Returns [`ExitCode::ValidationFailure`] if any row is invalid or missing
/// from the output.
pub(crate) async fn validate(dataset: &Dataset, input: &Path, cfg: &Config) -> Result<ExitCode> {
    let mapping = cfg.column_mapping(dataset.headers())?;
    let client = client::create(cfg)?;
    if cfg.check_connection {
        client.check_connection().await?;
    }
    let output = cfg
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    let pipeline = Pipeline::new(client, cfg.batch_size, cfg.max_workers)?.with_output(output);

    let mut progress = Progress::new(dataset.len(), cfg.no_progress);
    let report = pipeline
        .run(dataset, &mapping, &mut progress)
        .await
        .context("Processing failed")?;
    progress.finish("Finished");

    let summary = ValidationSummary::from_report(&report);
    info!(
        "Validated {} addresses, {}% valid",
        summary.total_addresses, summary.validation_rate
    );

    let formatted = get_stats_formatter(&cfg.format).format(&summary)?;
    let mut writer = super::create_writer(cfg.summary_output.as_deref())?;
    writeln!(writer, "{formatted}").context("Cannot write summary")?;

    Ok(if summary.is_success() {
        ExitCode::Success
    } else {
        ExitCode::ValidationFailure
    })
}

/// `data/addresses.csv` becomes `data/addresses_validated.csv`
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}{DEFAULT_OUTPUT_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("data/addresses.csv")),
            PathBuf::from("data/addresses_validated.csv")
        );
        assert_eq!(
            default_output_path(Path::new("addresses")),
            PathBuf::from("addresses_validated.csv")
        );
    }
}
