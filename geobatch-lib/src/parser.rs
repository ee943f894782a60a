//! Interpretation of API results as [`ValidationVerdict`]s.
//!
//! [`parse`] reads a raw Address Validation API response.
//! [`verdict`] judges any [`ApiResult`], delegating to [`parse`] for
//! successful validation responses.

use serde::Deserialize;
use serde_json::Value;

use crate::{ApiResult, ApiStatus, Confidence, RowId, ValidationVerdict, client::error_message};

/// Reported when the API considers the address incomplete
pub const ADDRESS_INCOMPLETE: &str = "Address incomplete";
/// Reported when parts of the address could not be confirmed
pub const UNCONFIRMED_COMPONENTS: &str = "Has unconfirmed components";
/// Reported when the API had to add parts to the address
pub const INFERRED_COMPONENTS: &str = "Has inferred components";
/// Reported when the API had to replace parts of the address
pub const REPLACED_COMPONENTS: &str = "Has replaced components";

#[derive(Debug, Deserialize)]
struct Response {
    result: Option<ResultBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultBody {
    #[serde(default)]
    verdict: Verdict,
    address: Option<Address>,
    geocode: Option<Geocode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Verdict {
    address_complete: Option<bool>,
    #[serde(default)]
    has_unconfirmed_components: bool,
    #[serde(default)]
    has_inferred_components: bool,
    #[serde(default)]
    has_replaced_components: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Address {
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Geocode {
    place_id: Option<String>,
}

/// Parse a raw Address Validation API response.
///
/// - A top-level `error` field makes the address invalid with the error
///   message as the only reason.
/// - The address is valid if the API reports it as complete.
/// - Confidence is [`Confidence::High`] with a place ID,
///   [`Confidence::Medium`] with any other geocode.
/// - Errors are listed in a fixed order: incomplete, unconfirmed, inferred,
///   replaced.
///
/// Responses that cannot be parsed yield an invalid verdict describing the
/// problem. This function never fails.
#[must_use]
pub fn parse(row_id: RowId, raw: &Value) -> ValidationVerdict {
    if let Some(error) = raw.get("error") {
        return ValidationVerdict::invalid(row_id, error_message(error));
    }

    let response = match Response::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            return ValidationVerdict::invalid(
                row_id,
                format!("Error parsing API response: {e}"),
            );
        }
    };
    let result = response.result.unwrap_or_default();
    let verdict = result.verdict;

    let confidence = match result.geocode {
        Some(Geocode {
            place_id: Some(_), ..
        }) => Confidence::High,
        Some(_) => Confidence::Medium,
        None => Confidence::Unknown,
    };

    let mut errors = Vec::new();
    if verdict.address_complete == Some(false) {
        errors.push(ADDRESS_INCOMPLETE.to_string());
    }
    if verdict.has_unconfirmed_components {
        errors.push(UNCONFIRMED_COMPONENTS.to_string());
    }
    if verdict.has_inferred_components {
        errors.push(INFERRED_COMPONENTS.to_string());
    }
    if verdict.has_replaced_components {
        errors.push(REPLACED_COMPONENTS.to_string());
    }

    ValidationVerdict {
        row_id,
        is_valid: verdict.address_complete.unwrap_or(false),
        confidence,
        formatted_address: result.address.and_then(|a| a.formatted_address),
        errors,
    }
}

/// Judge an [`ApiResult`].
///
/// Successful validation responses are [`parse`]d. Successful geocoding
/// responses are valid, with [`Confidence::High`] when the API returned a
/// place ID. Every other status is invalid and reported as its error.
#[must_use]
pub fn verdict(result: &ApiResult) -> ValidationVerdict {
    let row_id = result.row_id;
    match &result.status {
        ApiStatus::Ok => match &result.raw {
            Some(raw) if is_validation_response(raw) => parse(row_id, raw),
            _ => ValidationVerdict {
                row_id,
                is_valid: true,
                confidence: if result.place_id.is_some() {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
                formatted_address: result.formatted_address.clone(),
                errors: Vec::new(),
            },
        },
        ApiStatus::HttpError(code) => ValidationVerdict::invalid(row_id, format!("HTTP Error: {code}")),
        status @ (ApiStatus::ZeroResults | ApiStatus::OverQueryLimit) => {
            ValidationVerdict::invalid(row_id, status.to_string())
        }
        status => ValidationVerdict::invalid(
            row_id,
            result.error.clone().unwrap_or_else(|| status.to_string()),
        ),
    }
}

/// Validation responses wrap everything in `result`, geocoding responses
/// list `results`.
fn is_validation_response(raw: &Value) -> bool {
    raw.get("result").is_some() || raw.get("error").is_some()
}
