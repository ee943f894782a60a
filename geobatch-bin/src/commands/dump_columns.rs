use std::io::Write;

use anyhow::Result;
use geobatch_lib::Dataset;

use crate::ExitCode;

/// Print the column names of the input, one per line, without sending any
/// requests.
///
/// Helps to pick the values for `--address-column` and friends.
pub(crate) fn dump_columns(dataset: &Dataset) -> Result<ExitCode> {
    let mut writer = super::create_writer(None)?;
    write_columns(&mut writer, dataset.headers())?;
    Ok(ExitCode::Success)
}

fn write_columns(writer: &mut dyn Write, headers: &[String]) -> std::io::Result<()> {
    for header in headers {
        writeln!(writer, "{header}")?;
    }
    writer.flush()
}
