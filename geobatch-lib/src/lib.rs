//! `geobatch` is a library for resolving many addresses against the Google
//! Geocoding and Address Validation APIs.
//!
//! Process a whole CSV file:
//! ```no_run
//! use geobatch_lib::{ClientBuilder, ColumnMapping, Dataset, Pipeline, Result};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let client = ClientBuilder::builder()
//!     .api_key(SecretString::from("my-api-key".to_string()))
//!     .build()
//!     .client()?;
//!   let dataset = Dataset::from_path("addresses.csv".as_ref())?;
//!   let report = Pipeline::new(client, 100, 10)?
//!     .with_output("validated.csv".into())
//!     .run(&dataset, &ColumnMapping::full("address"), &mut ())
//!     .await?;
//!   println!("{} of {} addresses are valid", report.valid_count(), report.total);
//!   Ok(())
//! }
//! ```
//!
//! For single addresses use the [`Client`] directly and judge its result
//! with [`parser::verdict`]:
//!
//! ```no_run
//! use geobatch_lib::{AddressRecord, ApiMode, ClientBuilder, Result, RowId, parser};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let client = ClientBuilder::builder()
//!     .api_key(SecretString::from("my-api-key".to_string()))
//!     .mode(ApiMode::Geocode)
//!     .build()
//!     .client()?;
//!   let record = AddressRecord::new(RowId::new(0), "1600 Amphitheatre Pkwy", "US");
//!   let result = client.execute(&record).await?;
//!   println!("{:?}", parser::verdict(&result));
//!   Ok(())
//! }
//! ```
// #![deny(missing_docs)]

mod client;
mod retry;
mod types;

pub mod dataset;
pub mod dispatcher;
pub mod merge;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod ratelimit;
pub mod signer;

pub use client::{
    ApiMode, Auth, Client, ClientBuilder, DEFAULT_CHANNEL, DEFAULT_MAX_RATE_LIMIT_RETRIES,
    DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT_BACKOFF, DEFAULT_RETRY_WAIT_TIME,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, Executor, GEOCODE_URL, VALIDATION_URL,
};
pub use dataset::{AddressColumns, ColumnMapping, Dataset, InputRow};
pub use dispatcher::{BatchDispatcher, CheckpointObserver, DEFAULT_BATCH_SIZE, DEFAULT_MAX_WORKERS};
pub use pipeline::{EnrichedRow, Pipeline, Report};
pub use ratelimit::{DEFAULT_REQUESTS_PER_SECOND, RateLimitConfig, RateLimiter};
pub use types::*;
