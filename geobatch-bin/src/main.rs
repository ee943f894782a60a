//! `geobatch` resolves the addresses in a CSV file with the Google Geocoding
//! or Address Validation API.
//!
//! The geobatch binary is a wrapper around geobatch-lib, which provides
//! convenience functions for calling geobatch from the command-line.
//!
//! Validate a file with one address column:
//! ```sh
//! GOOGLE_API_KEY=... geobatch --address-column address addresses.csv
//! ```
//!
//! Compose the address from separate columns and geocode it:
//! ```sh
//! geobatch --mode geocode \
//!   --address-column Address --city-column City \
//!   --state-column State --zip-column Zip \
//!   -o geocoded.csv addresses.csv
//! ```
//!
//! List the columns of a file:
//! ```sh
//! geobatch --dump-columns addresses.csv
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use anyhow::{Context, Error, Result, bail};
use clap::{Parser, crate_version};
use formatters::log::init_logging;
use geobatch_lib::Dataset;
use log::error;

use options::GEOBATCH_CONFIG_FILE;

mod client;
mod commands;
mod formatters;
mod options;
mod progress;
mod stats;
mod verbosity;

use crate::options::{Config, GeobatchOptions};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator, e.g. an unreadable input file.
    #[allow(unused)]
    UnexpectedFailure = 1,
    /// Some rows are invalid, failed or missing from the output
    ValidationFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
fn load_config() -> Result<GeobatchOptions> {
    let mut opts = GeobatchOptions::parse();

    init_logging(&opts.config.verbose);

    // Load a potentially existing config file and merge it into the config from
    // the CLI
    if let Some(config_file) = &opts.config_file {
        match Config::load_from_file(config_file) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    config_file.display()
                );
            }
        }
    } else {
        // If no config file was explicitly provided, we try to load the default
        // config file from the current directory if the file exists. This will
        // raise an error if the file is invalid, just like the explicit provided
        // config file.
        let default_config = PathBuf::from(GEOBATCH_CONFIG_FILE);
        if default_config.is_file() {
            match Config::load_from_file(&default_config) {
                Ok(c) => opts.config.merge(c),
                Err(e) => {
                    bail!(
                        "Cannot load default configuration file `{}`: {e:?}",
                        default_config.display()
                    );
                }
            }
        }
    }

    opts.config.validate()?;

    Ok(opts)
}

/// Set up runtime and call geobatch entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let opts = match load_config() {
        Ok(opts) => opts,
        Err(e) => {
            error!(
                "Error while loading config: {e}\n\
                See: https://docs.rs/geobatch/{}",
                crate_version!()
            );
            exit(ExitCode::ConfigFile as i32);
        }
    };

    let runtime = match opts.config.threads {
        Some(threads) => {
            // We define our own runtime instead of the `tokio::main` attribute
            // since we want to make the number of threads configurable
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(threads)
                .enable_all()
                .build()?
        }
        None => tokio::runtime::Runtime::new()?,
    };

    match runtime.block_on(run(&opts)) {
        Err(e) if Some(ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Run geobatch on the given input
async fn run(opts: &GeobatchOptions) -> Result<i32> {
    let dataset = Dataset::from_path(&opts.input)
        .with_context(|| format!("Cannot read input `{}`", opts.input.display()))?;

    let exit_code = if opts.config.dump_columns {
        commands::dump_columns(&dataset)?
    } else {
        commands::validate(&dataset, &opts.input, &opts.config).await?
    };

    Ok(exit_code as i32)
}
