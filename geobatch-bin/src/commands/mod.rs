pub(crate) mod dump_columns;
pub(crate) mod validate;

pub(crate) use dump_columns::dump_columns;
pub(crate) use validate::validate;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Write to the given file, or to stdout if there is none
pub(crate) fn create_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    let out = if let Some(output) = output {
        let out = fs::File::create(output)
            .with_context(|| format!("Cannot create `{}`", output.display()))?;
        Box::new(out) as Box<dyn Write>
    } else {
        let out = io::stdout();
        Box::new(out.lock()) as Box<dyn Write>
    };
    Ok(out)
}
