//! Normalization of API response bodies into [`ApiResult`]s.
//!
//! Only the fields needed for the output are modeled. Everything else is
//! ignored here and kept verbatim in [`ApiResult::raw`].

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use super::ApiMode;
use crate::{ApiResult, ApiStatus, ErrorKind, Result, RowId};

/// Geocoding API response, see
/// <https://developers.google.com/maps/documentation/geocoding/requests-geocoding#GeocodingResponses>
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    place_id: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Address Validation API response, see
/// <https://developers.google.com/maps/documentation/address-validation/reference/rest/v1/TopLevel/validateAddress#response-body>
#[derive(Debug, Deserialize)]
struct ValidationResponse {
    result: Option<ValidationResult>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ValidationResult {
    address: Option<ValidatedAddress>,
    geocode: Option<ValidationGeocode>,
    verdict: Option<ValidationVerdictBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatedAddress {
    formatted_address: Option<String>,
    postal_address: Option<PostalAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostalAddress {
    postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationGeocode {
    location: Option<LatLngLiteral>,
    place_id: Option<String>,
    #[serde(default)]
    place_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LatLngLiteral {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationVerdictBody {
    geocode_granularity: Option<String>,
}

/// Turn a successful (2xx) response body into an [`ApiResult`].
///
/// # Errors
///
/// Returns [`ErrorKind::ValidationApi`] if the body is not JSON or does not
/// have the expected shape.
pub(crate) fn normalize(mode: ApiMode, row_id: RowId, body: &str) -> Result<ApiResult> {
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| ErrorKind::ValidationApi(format!("response is not valid JSON: {e}")))?;

    let result = match mode {
        ApiMode::Geocode => normalize_geocode(row_id, &raw)?,
        ApiMode::Validate => normalize_validation(row_id, &raw)?,
    };
    Ok(result.with_raw(raw))
}

fn normalize_geocode(row_id: RowId, raw: &Value) -> Result<ApiResult> {
    let response = GeocodeResponse::deserialize(raw)
        .map_err(|e| ErrorKind::ValidationApi(format!("unexpected geocoding response: {e}")))?;

    let status = response.status.as_deref().map(ApiStatus::from_api);
    let result_count = response.results.len();

    let Some(best) = response.results.into_iter().next() else {
        let status = match status {
            None | Some(ApiStatus::Ok) => ApiStatus::ZeroResults,
            Some(other) => other,
        };
        let error = (!status.is_ok() && status != ApiStatus::ZeroResults)
            .then(|| response.error_message.unwrap_or_else(|| status.to_string()));
        return Ok(ApiResult {
            error,
            ..ApiResult::empty(row_id, status)
        });
    };

    let postal_codes: Vec<String> = best
        .address_components
        .into_iter()
        .filter(|component| component.types.iter().any(|t| t == "postal_code"))
        .map(|component| component.long_name)
        .collect();

    let (location, location_type) = match best.geometry {
        Some(geometry) => (geometry.location, geometry.location_type),
        None => (None, None),
    };

    Ok(ApiResult {
        formatted_address: best.formatted_address,
        latitude: location.as_ref().map(|l| l.lat),
        longitude: location.as_ref().map(|l| l.lng),
        location_type,
        place_id: best.place_id,
        types: best.types.into_iter().collect(),
        postal_code: (!postal_codes.is_empty()).then(|| postal_codes.join(",")),
        result_count,
        error: response.error_message,
        ..ApiResult::empty(row_id, status.unwrap_or(ApiStatus::Ok))
    })
}

fn normalize_validation(row_id: RowId, raw: &Value) -> Result<ApiResult> {
    let response = ValidationResponse::deserialize(raw)
        .map_err(|e| ErrorKind::ValidationApi(format!("unexpected validation response: {e}")))?;

    if let Some(error) = response.error {
        let message = error_message(&error);
        return Ok(ApiResult {
            error: Some(message),
            ..ApiResult::empty(row_id, ApiStatus::Other("ERROR".to_string()))
        });
    }

    let Some(result) = response.result else {
        return Ok(ApiResult::empty(row_id, ApiStatus::ZeroResults));
    };

    let (formatted_address, postal_code) = match result.address {
        Some(address) => (
            address.formatted_address,
            address.postal_address.and_then(|p| p.postal_code),
        ),
        None => (None, None),
    };
    let (location, place_id, types) = match result.geocode {
        Some(geocode) => (
            geocode.location,
            geocode.place_id,
            geocode.place_types.into_iter().collect(),
        ),
        None => (None, None, BTreeSet::new()),
    };

    Ok(ApiResult {
        formatted_address,
        latitude: location.as_ref().map(|l| l.latitude),
        longitude: location.as_ref().map(|l| l.longitude),
        location_type: result.verdict.and_then(|v| v.geocode_granularity),
        place_id,
        types,
        postal_code,
        result_count: 1,
        ..ApiResult::empty(row_id, ApiStatus::Ok)
    })
}

/// Extract a message from an `error` field, which is either a plain string
/// or a Google API error object (`{"code": .., "message": ..}`).
pub(crate) fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToString::to_string),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const ID: RowId = RowId::new(7);

    #[test]
    fn test_geocode_ok() {
        let body = json!({
            "status": "OK",
            "results": [{
                "formatted_address": "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
                "geometry": {
                    "location": {"lat": 37.422, "lng": -122.084},
                    "location_type": "ROOFTOP"
                },
                "place_id": "ChIJ2eUgeAK6j4ARbn5u_wAGqWA",
                "types": ["street_address"],
                "address_components": [
                    {"long_name": "1600", "types": ["street_number"]},
                    {"long_name": "94043", "types": ["postal_code"]}
                ]
            }, {
                "formatted_address": "Mountain View, CA, USA"
            }]
        });

        let result = normalize(ApiMode::Geocode, ID, &body.to_string()).unwrap();

        assert_eq!(result.row_id, ID);
        assert_eq!(result.status, ApiStatus::Ok);
        assert_eq!(
            result.formatted_address.as_deref(),
            Some("1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA")
        );
        assert_eq!(result.latitude, Some(37.422));
        assert_eq!(result.longitude, Some(-122.084));
        assert_eq!(result.location_type.as_deref(), Some("ROOFTOP"));
        assert_eq!(result.postal_code.as_deref(), Some("94043"));
        assert_eq!(result.types_joined(), "street_address");
        assert_eq!(result.result_count, 2);
        assert_eq!(result.raw, Some(body));
    }

    #[test]
    fn test_geocode_zero_results() {
        let body = r#"{"status": "ZERO_RESULTS", "results": []}"#;
        let result = normalize(ApiMode::Geocode, ID, body).unwrap();
        assert_eq!(result.status, ApiStatus::ZeroResults);
        assert_eq!(result.error, None);
        assert_eq!(result.result_count, 0);
        assert_eq!(result.latitude, None);

        // A missing result list counts as no results as well
        let result = normalize(ApiMode::Geocode, ID, "{}").unwrap();
        assert_eq!(result.status, ApiStatus::ZeroResults);
    }

    #[test]
    fn test_geocode_denied() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "results": []}"#;
        let result = normalize(ApiMode::Geocode, ID, body).unwrap();
        assert_eq!(result.status, ApiStatus::Other("REQUEST_DENIED".into()));
        assert_eq!(
            result.error.as_deref(),
            Some("The provided API key is invalid.")
        );
    }

    #[test]
    fn test_validation_ok() {
        let body = json!({
            "result": {
                "verdict": {"addressComplete": true, "geocodeGranularity": "PREMISE"},
                "address": {
                    "formattedAddress": "1 Main St, Springfield, IL 62701, USA",
                    "postalAddress": {"postalCode": "62701"}
                },
                "geocode": {
                    "location": {"latitude": 39.8, "longitude": -89.6},
                    "placeId": "abc",
                    "placeTypes": ["premise"]
                }
            }
        });

        let result = normalize(ApiMode::Validate, ID, &body.to_string()).unwrap();
        assert_eq!(result.status, ApiStatus::Ok);
        assert_eq!(result.place_id.as_deref(), Some("abc"));
        assert_eq!(result.location_type.as_deref(), Some("PREMISE"));
        assert_eq!(result.postal_code.as_deref(), Some("62701"));
        assert_eq!(result.latitude, Some(39.8));
        assert_eq!(result.result_count, 1);
    }

    #[test]
    fn test_validation_without_result() {
        let result = normalize(ApiMode::Validate, ID, "{}").unwrap();
        assert_eq!(result.status, ApiStatus::ZeroResults);
    }

    #[test]
    fn test_validation_error_object() {
        let body = r#"{"error": {"code": 400, "message": "Address is empty", "status": "INVALID_ARGUMENT"}}"#;
        let result = normalize(ApiMode::Validate, ID, body).unwrap();
        assert_eq!(result.error.as_deref(), Some("Address is empty"));
        assert!(!result.is_success());
    }

    #[test]
    fn test_not_json() {
        let err = normalize(ApiMode::Geocode, ID, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ErrorKind::ValidationApi(_)));
    }

    #[test]
    fn test_unexpected_shape() {
        let err = normalize(ApiMode::Geocode, ID, r#"{"results": 42}"#).unwrap_err();
        assert!(matches!(err, ErrorKind::ValidationApi(_)));
    }
}
