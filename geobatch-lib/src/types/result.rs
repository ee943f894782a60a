use std::collections::BTreeSet;

use serde::Serialize;

use crate::{ApiStatus, RowId};

/// Error message for records without an address
pub const EMPTY_ADDRESS_MESSAGE: &str = "Empty address";

/// Normalized outcome of one API call.
///
/// Exactly one `ApiResult` is produced for every [`AddressRecord`], whether
/// or not a request was actually sent. Location fields are only populated
/// when [`ApiResult::status`] is [`ApiStatus::Ok`].
///
/// [`AddressRecord`]: crate::AddressRecord
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    /// Row of the record this result belongs to
    pub row_id: RowId,
    /// Canonical address as returned by the API
    pub formatted_address: Option<String>,
    /// Latitude of the best match
    pub latitude: Option<f64>,
    /// Longitude of the best match
    pub longitude: Option<f64>,
    /// Precision of the location, e.g. `ROOFTOP`
    pub location_type: Option<String>,
    /// Google place identifier
    pub place_id: Option<String>,
    /// Feature types of the best match
    pub types: BTreeSet<String>,
    /// Postal code(s) of the best match, comma-separated
    pub postal_code: Option<String>,
    /// Number of candidate results the API returned
    pub result_count: usize,
    /// Call outcome
    pub status: ApiStatus,
    /// Human-readable reason for a failed call
    pub error: Option<String>,
    /// The raw JSON body, kept for the `api_response` column
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

impl ApiResult {
    /// A result without any location data
    #[must_use]
    pub const fn empty(row_id: RowId, status: ApiStatus) -> Self {
        Self {
            row_id,
            formatted_address: None,
            latitude: None,
            longitude: None,
            location_type: None,
            place_id: None,
            types: BTreeSet::new(),
            postal_code: None,
            result_count: 0,
            status,
            error: None,
            raw: None,
        }
    }

    /// Result for a record that was skipped because its address is blank
    #[must_use]
    pub fn empty_address(row_id: RowId) -> Self {
        Self {
            error: Some(EMPTY_ADDRESS_MESSAGE.to_string()),
            ..Self::empty(row_id, ApiStatus::EmptyAddress)
        }
    }

    /// Result for a non-success HTTP status code
    #[must_use]
    pub fn http_error(row_id: RowId, code: u16) -> Self {
        Self {
            error: Some(format!("HTTP Error: {code}")),
            ..Self::empty(row_id, ApiStatus::HttpError(code))
        }
    }

    /// Result for a request that never produced a usable response
    pub fn transport_error<S: Into<String>>(row_id: RowId, message: S) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(row_id, ApiStatus::TransportError)
        }
    }

    /// Attach the raw response body
    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Returns `true` if the API resolved the address
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Feature types joined with `,`, as written to the output
    #[must_use]
    pub fn types_joined(&self) -> String {
        self.types.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let id = RowId::new(4);

        let result = ApiResult::http_error(id, 500);
        assert_eq!(result.status, ApiStatus::HttpError(500));
        assert_eq!(result.error.as_deref(), Some("HTTP Error: 500"));
        assert!(!result.is_success());

        let result = ApiResult::empty_address(id);
        assert_eq!(result.status, ApiStatus::EmptyAddress);
        assert_eq!(result.error.as_deref(), Some("Empty address"));
        assert_eq!(result.result_count, 0);
    }

    #[test]
    fn test_types_joined() {
        let mut result = ApiResult::empty(RowId::new(0), ApiStatus::Ok);
        result.types = ["street_address", "premise"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(result.types_joined(), "premise,street_address");
    }
}
