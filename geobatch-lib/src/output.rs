//! CSV output of enriched rows.
//!
//! Every output row is the input row followed by the [`RESULT_COLUMNS`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use log::debug;
use serde_json::json;

use crate::{ApiResult, ErrorKind, Result, ValidationVerdict, dataset::InputRow};

/// Columns appended to every input row, in order
pub const RESULT_COLUMNS: [&str; 13] = [
    "is_valid",
    "validation_confidence",
    "formatted_address",
    "validation_errors",
    "api_response",
    "latitude",
    "longitude",
    "location_type",
    "place_id",
    "types",
    "postal_code",
    "result_count",
    "status",
];

/// Where partial output for `output` is kept during a run
#[must_use]
pub fn temp_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push("_temp.csv");
    PathBuf::from(path)
}

/// Remove the partial output for `output`, if there is any.
///
/// # Errors
///
/// Fails if the file exists but cannot be removed.
pub fn remove_temp(output: &Path) -> Result<bool> {
    let temp = temp_path(output);
    match fs::remove_file(&temp) {
        Ok(()) => {
            debug!("Removed intermediate results {}", temp.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ErrorKind::from((temp, e))),
    }
}

/// Header row of the output
#[must_use]
pub fn output_headers(input_headers: &[String]) -> Vec<String> {
    input_headers
        .iter()
        .cloned()
        .chain(RESULT_COLUMNS.iter().map(ToString::to_string))
        .collect()
}

/// Values for the [`RESULT_COLUMNS`] of one row
#[must_use]
pub fn result_values(result: &ApiResult, verdict: &ValidationVerdict) -> [String; 13] {
    let optional = |value: Option<&str>| value.unwrap_or_default().to_string();
    let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    [
        verdict.is_valid.to_string(),
        verdict.confidence.to_string(),
        optional(
            verdict
                .formatted_address
                .as_deref()
                .or(result.formatted_address.as_deref()),
        ),
        verdict.error_summary().unwrap_or_default(),
        api_response(result),
        number(result.latitude),
        number(result.longitude),
        optional(result.location_type.as_deref()),
        optional(result.place_id.as_deref()),
        result.types_joined(),
        optional(result.postal_code.as_deref()),
        result.result_count.to_string(),
        result.status.to_string(),
    ]
}

/// The raw API body, or the error in its place if there is no body
fn api_response(result: &ApiResult) -> String {
    match (&result.raw, &result.error) {
        (Some(raw), _) => raw.to_string(),
        (None, Some(error)) => json!({ "error": error }).to_string(),
        (None, None) => String::new(),
    }
}

/// Streams enriched rows as CSV
#[derive(Debug)]
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvOutput<File> {
    /// Create (or truncate) the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ErrorKind::from((path.to_path_buf(), e)))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvOutput<W> {
    /// Write CSV to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(writer),
        }
    }

    /// Write the header row
    ///
    /// # Errors
    ///
    /// Fails if writing fails.
    pub fn write_headers(&mut self, input_headers: &[String]) -> Result<()> {
        self.writer.write_record(output_headers(input_headers))?;
        Ok(())
    }

    /// Write one enriched row
    ///
    /// # Errors
    ///
    /// Fails if writing fails.
    pub fn write_row(
        &mut self,
        row: &InputRow,
        result: &ApiResult,
        verdict: &ValidationVerdict,
    ) -> Result<()> {
        let extra = result_values(result, verdict);
        let values = row
            .values
            .iter()
            .map(String::as_str)
            .chain(extra.iter().map(String::as_str))
            .collect::<Vec<_>>();
        self.writer.write_record(values)?;
        Ok(())
    }

    /// Flush and return the underlying writer
    ///
    /// # Errors
    ///
    /// Fails if flushing fails.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ErrorKind::from(io::Error::other(e.to_string())))
    }
}

/// Write a complete output file.
///
/// # Errors
///
/// Fails if the file cannot be created or written.
pub fn write_output<'a, I>(path: &Path, input_headers: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a InputRow, &'a ApiResult, &'a ValidationVerdict)>,
{
    let mut output = CsvOutput::create(path)?;
    output.write_headers(input_headers)?;
    let mut count = 0;
    for (row, result, verdict) in rows {
        output.write_row(row, result, verdict)?;
        count += 1;
    }
    output
        .finish()?
        .sync_all()
        .map_err(|e| ErrorKind::from((path.to_path_buf(), e)))?;
    debug!("Wrote {count} rows to {}", path.display());
    Ok(())
}
