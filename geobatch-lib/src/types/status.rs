use std::fmt::Display;

use serde::{Serialize, Serializer};

/// Outcome of a single API call, as reported in the `status` column.
///
/// Only [`ApiStatus::Ok`] carries location data. Every other variant
/// describes why a record could not be resolved; these are plain values and
/// never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// The API resolved the address
    Ok,
    /// The API answered successfully, but found nothing
    ZeroResults,
    /// The API reported that the request quota is used up
    OverQueryLimit,
    /// The API answered with a non-success HTTP status code
    HttpError(u16),
    /// The request could not be delivered, see the result's error message
    TransportError,
    /// The record had no address, so no request was sent
    EmptyAddress,
    /// Any other status string the API reported (e.g. `REQUEST_DENIED`)
    Other(String),
}

impl ApiStatus {
    /// Map the top-level `status` field of an API response
    #[must_use]
    pub fn from_api(status: &str) -> Self {
        match status {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` if the API resolved the address
    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns `true` if no request reached the API or the API could not
    /// be reached at all
    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::TransportError | Self::HttpError(_))
    }
}

impl Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::ZeroResults => write!(f, "ZERO_RESULTS"),
            Self::OverQueryLimit => write!(f, "OVER_QUERY_LIMIT"),
            Self::HttpError(code) => write!(f, "HTTP_ERROR({code})"),
            Self::TransportError => write!(f, "TRANSPORT_ERROR"),
            Self::EmptyAddress => write!(f, "EMPTY_ADDRESS"),
            Self::Other(status) => write!(f, "{status}"),
        }
    }
}

impl Serialize for ApiStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiStatus;

    #[test]
    fn test_from_api() {
        assert_eq!(ApiStatus::from_api("OK"), ApiStatus::Ok);
        assert_eq!(ApiStatus::from_api("ZERO_RESULTS"), ApiStatus::ZeroResults);
        assert_eq!(
            ApiStatus::from_api("OVER_QUERY_LIMIT"),
            ApiStatus::OverQueryLimit
        );
        assert_eq!(
            ApiStatus::from_api("REQUEST_DENIED"),
            ApiStatus::Other("REQUEST_DENIED".into())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiStatus::HttpError(500).to_string(), "HTTP_ERROR(500)");
        assert_eq!(ApiStatus::TransportError.to_string(), "TRANSPORT_ERROR");
        assert_eq!(
            ApiStatus::Other("INVALID_REQUEST".into()).to_string(),
            "INVALID_REQUEST"
        );
    }
}
