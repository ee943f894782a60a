use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

use crate::{formatters, verbosity::Verbosity};

/// Width of the right-aligned `[LEVEL]` prefix, e.g. `[ERROR]`
const LEVEL_PREFIX_WIDTH: usize = 7;

/// Initialize the logging system with the given verbosity level.
pub(crate) fn init_logging(verbose: &Verbosity) {
    // Set a base level for all modules to `warn`, which is a reasonable default.
    // It will be overridden by RUST_LOG if it's set.
    let env = Env::default().filter_or("RUST_LOG", "warn");

    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if std::env::var("RUST_LOG").is_err() {
        // Adjust the base log level filter based on the verbosity from CLI.
        // This applies to all modules not explicitly mentioned in RUST_LOG.
        let level_filter = verbose.log_level_filter();

        // Dependencies (reqwest, hyper) only get to report warnings.
        builder.filter_level(LevelFilter::Warn);

        builder
            .filter_module("geobatch", level_filter)
            .filter_module("geobatch_lib", level_filter);
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let prefix = format!("[{level}]");
        let color = formatters::color::color_for_level(level);
        writeln!(
            buf,
            "{} {}",
            color.apply_to(format!("{prefix:>width$}", width = LEVEL_PREFIX_WIDTH)),
            record.args()
        )
    });

    builder.init();
}
