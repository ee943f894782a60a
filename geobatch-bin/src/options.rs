use crate::verbosity::Verbosity;
use anyhow::{Context, Error, Result, anyhow, bail};
use clap::builder::PossibleValuesParser;
use clap::{Parser, builder::TypedValueParser};
use const_format::{concatcp, formatcp};
use geobatch_lib::{
    ApiMode, Auth, ColumnMapping, DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_WORKERS, DEFAULT_RATE_LIMIT_BACKOFF, DEFAULT_REGION, DEFAULT_REQUESTS_PER_SECOND,
    DEFAULT_RETRY_WAIT_TIME, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, SUPPORTED_REGIONS,
    is_supported_region,
};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::{fs, path::PathBuf, str::FromStr, time::Duration};
use strum::{Display, VariantNames};
use url::Url;

pub(crate) const GEOBATCH_CONFIG_FILE: &str = "geobatch.toml";

/// Older deployments name the signing key like this
const LEGACY_PRIVATE_KEY_ENV: &str = "GOOGLE_PRIVATE_KEY";

// this exists because clap requires `&str` type values for defaults
// whereas serde expects owned `String` types
const BATCH_SIZE_STR: &str = concatcp!(DEFAULT_BATCH_SIZE);
const MAX_WORKERS_STR: &str = concatcp!(DEFAULT_MAX_WORKERS);
const MAX_RETRIES_STR: &str = concatcp!(DEFAULT_MAX_RETRIES);
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS, "s");
const RETRY_WAIT_TIME_STR: &str = "100ms";
const RATE_LIMIT_BACKOFF_STR: &str = "1s";
// We use a custom help message here because we want to show the default
// value of the config file, but also be able to check if the user has
// provided a custom value. If they didn't, we won't throw an error if
// the file doesn't exist.
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    GEOBATCH_CONFIG_FILE,
);

/// The format to use for the final validation summary
#[derive(Debug, Deserialize, Default, Clone, Display, VariantNames, PartialEq, Eq)]
#[non_exhaustive]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub(crate) enum StatsFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for StatsFormat {
    type Err = Error;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_lowercase().as_str() {
            "compact" | "string" => Ok(StatsFormat::Compact),
            "json" => Ok(StatsFormat::Json),
            _ => Err(anyhow!("Unknown format {format}")),
        }
    }
}

// Macro for generating default functions to be used by serde
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

// Generate the functions for serde defaults
default_function! {
    batch_size: usize = DEFAULT_BATCH_SIZE;
    max_workers: usize = DEFAULT_MAX_WORKERS;
    requests_per_second: f64 = DEFAULT_REQUESTS_PER_SECOND;
    max_retries: u64 = DEFAULT_MAX_RETRIES;
    retry_wait_time: Duration = DEFAULT_RETRY_WAIT_TIME;
    rate_limit_backoff: Duration = DEFAULT_RATE_LIMIT_BACKOFF;
    timeout: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    channel: String = DEFAULT_CHANNEL.to_string();
    default_region: String = DEFAULT_REGION.to_string();
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    verbosity: Verbosity = Verbosity::default();
}

// Macro for merging configuration values
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// geobatch resolves the addresses in a CSV file with the Google Geocoding or
/// Address Validation API and writes them back out, enriched with coordinates,
/// canonical addresses and a validity verdict.
///
/// geobatch is powered by geobatch-lib, the Rust library for batch geocoding.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct GeobatchOptions {
    /// CSV file with a header row
    #[arg(name = "input")]
    pub(crate) input: PathBuf,

    /// Configuration file to use
    #[arg(short, long = "config")]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,
}

/// The main configuration for geobatch
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Verbose program output
    #[clap(flatten)]
    #[serde(default = "verbosity")]
    pub(crate) verbose: Verbosity,

    /// Do not show progress bar.
    /// This is recommended for non-interactive shells (e.g. for continuous integration)
    #[arg(short, long, verbatim_doc_comment)]
    #[serde(default)]
    pub(crate) no_progress: bool,

    /// Which API to send the addresses to
    #[arg(
        long,
        default_value = "validate",
        value_parser = PossibleValuesParser::new(ApiMode::VARIANTS)
            .map(|s| s.parse::<ApiMode>().unwrap_or_default())
    )]
    #[serde(default)]
    pub(crate) mode: ApiMode,

    /// API key, used unless a client ID and private key are set
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    #[serde(default)]
    pub(crate) api_key: Option<SecretString>,

    /// Client ID for signed requests
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    #[serde(default)]
    pub(crate) client_id: Option<String>,

    /// URL-safe base64 encoded private key for signed requests
    #[arg(long, env = "GOOGLE_MAPS_PRIVATE_KEY", hide_env_values = true)]
    #[serde(default)]
    pub(crate) private_key: Option<SecretString>,

    /// Usage reporting channel, sent with signed requests
    #[arg(long, env = "GEOBATCH_CHANNEL", default_value = DEFAULT_CHANNEL)]
    #[serde(default = "channel")]
    pub(crate) channel: String,

    /// Send requests to this URL instead of the public API endpoint
    #[arg(long)]
    #[serde(default)]
    pub(crate) base_url: Option<Url>,

    /// Column holding the full address, or the street address if the
    /// city, state and zip columns are set as well
    #[arg(long, value_name = "COLUMN")]
    #[serde(default)]
    pub(crate) address_column: Option<String>,

    /// Column holding the city
    #[arg(long, value_name = "COLUMN", requires = "address_column")]
    #[serde(default)]
    pub(crate) city_column: Option<String>,

    /// Column holding the state or province
    #[arg(long, value_name = "COLUMN", requires = "address_column")]
    #[serde(default)]
    pub(crate) state_column: Option<String>,

    /// Column holding the postal code
    #[arg(long, value_name = "COLUMN", requires = "address_column")]
    #[serde(default)]
    pub(crate) zip_column: Option<String>,

    /// Column holding a per-row region code.
    /// Rows with an empty cell use the default region
    #[arg(long, value_name = "COLUMN", verbatim_doc_comment)]
    #[serde(default)]
    pub(crate) region_column: Option<String>,

    /// Region code for rows without one, e.g. `US` or `DE`
    #[arg(long, env = "DEFAULT_REGION", default_value = DEFAULT_REGION)]
    #[serde(default = "default_region")]
    pub(crate) default_region: String,

    /// Number of records per batch.
    /// Partial results are saved after every batch
    #[arg(long, env = "BATCH_SIZE", default_value = &BATCH_SIZE_STR, verbatim_doc_comment)]
    #[serde(default = "batch_size")]
    pub(crate) batch_size: usize,

    /// Maximum number of concurrent requests
    #[arg(long, env = "MAX_WORKERS", default_value = &MAX_WORKERS_STR)]
    #[serde(default = "max_workers")]
    pub(crate) max_workers: usize,

    /// Maximum number of requests per second, across all workers
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_SECOND)]
    #[serde(default = "requests_per_second")]
    pub(crate) requests_per_second: f64,

    /// Maximum number of attempts per address
    #[arg(long, env = "MAX_RETRIES", default_value = &MAX_RETRIES_STR)]
    #[serde(default = "max_retries")]
    pub(crate) max_retries: u64,

    /// Base wait time between attempts after a network error.
    /// The wait grows with every attempt
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = &RETRY_WAIT_TIME_STR,
        verbatim_doc_comment
    )]
    #[serde(default = "retry_wait_time")]
    #[serde(with = "humantime_serde")]
    pub(crate) retry_wait_time: Duration,

    /// Base wait time after the API reported rate limiting.
    /// The wait doubles with every re-send
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = &RATE_LIMIT_BACKOFF_STR,
        verbatim_doc_comment
    )]
    #[serde(default = "rate_limit_backoff")]
    #[serde(with = "humantime_serde")]
    pub(crate) rate_limit_backoff: Duration,

    /// Response timeout per request
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = &TIMEOUT_STR)]
    #[serde(default = "timeout")]
    #[serde(with = "humantime_serde")]
    pub(crate) timeout: Duration,

    /// User agent
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Output file for the enriched rows
    #[arg(short, long, value_parser)]
    #[serde(default)]
    pub(crate) output: Option<PathBuf>,

    /// Output format of the validation summary
    #[arg(short, long, default_value = "compact", value_parser = PossibleValuesParser::new(StatsFormat::VARIANTS).map(|s| s.parse::<StatsFormat>().unwrap_or_default()))]
    #[serde(default)]
    pub(crate) format: StatsFormat,

    /// Write the validation summary to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    #[serde(default)]
    pub(crate) summary_output: Option<PathBuf>,

    /// Send one sample lookup before the run and abort if it fails
    #[arg(long)]
    #[serde(default)]
    pub(crate) check_connection: bool,

    /// Don't send any requests.
    /// Instead, print the column names of the input
    #[arg(long, verbatim_doc_comment)]
    #[serde(default)]
    pub(crate) dump_columns: bool,

    /// Number of threads to utilize.
    /// Defaults to number of cores available to the system
    #[arg(short = 'T', long)]
    #[serde(default)]
    pub(crate) threads: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        // Read configuration file
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // Secrets are outside of fold_in! because SecretBox doesn't implement Eq.
        if self.api_key.is_none() && toml.api_key.is_some() {
            self.api_key = toml.api_key;
        }
        if self.private_key.is_none() && toml.private_key.is_some() {
            self.private_key = toml.private_key;
        }

        // NOTE: if you see an error within this macro call, check to make sure that
        // that the fields provided to fold_in! match all the fields of the Config struct.
        fold_in! {
            // Destination and source configs
            self, toml;

            Config {
                // Keys which are handled outside of fold_in
                ..api_key,
                ..private_key,

                // Keys with defaults to assign
                address_column: None,
                base_url: None,
                batch_size: DEFAULT_BATCH_SIZE,
                channel: DEFAULT_CHANNEL,
                check_connection: false,
                city_column: None,
                client_id: None,
                default_region: DEFAULT_REGION,
                dump_columns: false,
                format: StatsFormat::default(),
                max_retries: DEFAULT_MAX_RETRIES,
                max_workers: DEFAULT_MAX_WORKERS,
                mode: ApiMode::default(),
                no_progress: false,
                output: None,
                rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
                region_column: None,
                requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
                retry_wait_time: DEFAULT_RETRY_WAIT_TIME,
                state_column: None,
                summary_output: None,
                threads: None,
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                user_agent: DEFAULT_USER_AGENT,
                verbose: Verbosity::default(),
                zip_column: None,
            }
        }
    }

    /// The signing key, falling back to the legacy environment variable
    pub(crate) fn private_key(&self) -> Option<SecretString> {
        self.private_key.clone().or_else(|| {
            std::env::var(LEGACY_PRIVATE_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from)
        })
    }

    /// Reject settings that cannot work before any request is sent
    pub(crate) fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("`batch_size` must be at least 1");
        }
        if self.max_workers == 0 {
            bail!("`max_workers` must be at least 1");
        }
        if self.max_retries == 0 {
            bail!("`max_retries` must be at least 1");
        }
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            bail!(
                "`requests_per_second` must be a positive number, got {}",
                self.requests_per_second
            );
        }
        if !is_supported_region(&self.default_region) {
            bail!(
                "Unsupported region `{}`. Supported regions: {}",
                self.default_region,
                SUPPORTED_REGIONS.join(", ")
            );
        }
        // Listing columns sends no requests
        if !self.dump_columns {
            Auth::from_credentials(
                self.api_key.clone(),
                self.client_id.clone(),
                self.private_key(),
                self.channel.clone(),
            )?;
        }
        Ok(())
    }

    /// Which columns hold the address
    pub(crate) fn column_mapping(&self, available: &[String]) -> Result<ColumnMapping> {
        let Some(address) = &self.address_column else {
            bail!(
                "No address column given. Use `--address-column`, optionally with `--city-column`, `--state-column` and `--zip-column`. Available columns: {}",
                available.join(", ")
            );
        };

        let mapping = match (&self.city_column, &self.state_column, &self.zip_column) {
            (None, None, None) => ColumnMapping::full(address.as_str()),
            (Some(city), Some(state), Some(zip)) => ColumnMapping::components(
                address.as_str(),
                city.as_str(),
                state.as_str(),
                zip.as_str(),
            ),
            _ => bail!(
                "Address components need all of `--city-column`, `--state-column` and `--zip-column`"
            ),
        };

        let mapping = mapping.with_default_region(self.default_region.as_str());
        Ok(match &self.region_column {
            Some(region) => mapping.with_region_column(region.as_str()),
            None => mapping,
        })
    }
}
