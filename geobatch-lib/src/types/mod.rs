#![allow(unreachable_pub)]

mod checkpoint;
mod error;
mod record;
mod region;
mod request;
mod result;
mod status;
mod verdict;

pub use checkpoint::BatchCheckpoint;
pub use error::ErrorKind;
pub use record::{AddressRecord, RowId};
pub use region::{DEFAULT_REGION, SUPPORTED_REGIONS, is_supported_region};
pub use request::SignedRequest;
pub use result::{ApiResult, EMPTY_ADDRESS_MESSAGE};
pub use status::ApiStatus;
pub use verdict::{Confidence, ValidationVerdict};

/// The geobatch `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
