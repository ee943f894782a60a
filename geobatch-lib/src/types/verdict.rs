use serde::Serialize;
use strum::{Display, EnumString, VariantNames};

use crate::RowId;

/// How sure the API is about the location of an address
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Confidence {
    /// The address was matched to a specific place
    High,
    /// The address was geocoded, but not matched to a place
    Medium,
    /// No geocode information available
    #[default]
    Unknown,
}

/// Normalized judgement about a single address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    /// Row of the record this verdict belongs to
    pub row_id: RowId,
    /// Whether the address is considered deliverable
    pub is_valid: bool,
    /// Location confidence
    pub confidence: Confidence,
    /// Canonical address, if the API returned one
    pub formatted_address: Option<String>,
    /// Reasons the address is not (fully) valid, in a fixed order
    pub errors: Vec<String>,
}

impl ValidationVerdict {
    /// A negative verdict with a single reason
    pub fn invalid<S: Into<String>>(row_id: RowId, error: S) -> Self {
        Self {
            row_id,
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    /// All errors joined with `"; "`, or `None` if there are none
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        (!self.errors.is_empty()).then(|| self.errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_confidence_roundtrip_names() {
        assert_eq!(Confidence::High.to_string(), "HIGH");
        assert_eq!(Confidence::from_str("medium").unwrap(), Confidence::Medium);
        assert_eq!(Confidence::default(), Confidence::Unknown);
    }

    #[test]
    fn test_error_summary() {
        let mut verdict = ValidationVerdict::invalid(RowId::new(1), "Address incomplete");
        verdict.errors.push("Has inferred components".into());
        assert_eq!(
            verdict.error_summary().as_deref(),
            Some("Address incomplete; Has inferred components")
        );

        let verdict = ValidationVerdict {
            is_valid: true,
            ..ValidationVerdict::default()
        };
        assert_eq!(verdict.error_summary(), None);
    }
}
