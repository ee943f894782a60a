/// Default region code for addresses without an explicit one
pub const DEFAULT_REGION: &str = "US";

/// Region codes supported by the Address Validation API
pub const SUPPORTED_REGIONS: &[&str] = &[
    "AR", "AT", "AU", "BE", "BG", "BR", "CA", "CH", "CL", "CO", "CZ", "DE", "DK", "EE", "ES", "FI",
    "FR", "GB", "HR", "HU", "IE", "IN", "IT", "LT", "LU", "LV", "MX", "MY", "NL", "NO", "NZ", "PL",
    "PR", "PT", "SE", "SG", "SI", "SK", "US",
];

/// Returns `true` if the (case-insensitive) region code is supported
#[must_use]
pub fn is_supported_region(code: &str) -> bool {
    SUPPORTED_REGIONS
        .iter()
        .any(|region| region.eq_ignore_ascii_case(code.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_regions() {
        assert!(is_supported_region(DEFAULT_REGION));
        assert!(is_supported_region("de"));
        assert!(is_supported_region(" GB "));
        assert!(!is_supported_region("XX"));
        assert!(!is_supported_region(""));
    }
}
