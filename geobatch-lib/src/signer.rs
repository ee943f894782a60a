//! Signing of request URLs for Google Maps Platform client IDs.
//!
//! A signature is the URL-safe base64 encoded HMAC-SHA1 of the URL's path
//! and query (`/maps/api/geocode/json?address=..&client=..`), keyed with the
//! client's decoded private key. It is appended as the last query
//! parameter, `signature`. Scheme and host are not part of the signed data.
//!
//! See <https://developers.google.com/maps/documentation/maps-static/digital-signature>

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE},
};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use crate::{ErrorKind, Result};

type HmacSha1 = Hmac<Sha1>;

/// Private keys are distributed with padding, but copies without it are
/// common.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Sign `url` with a URL-safe base64 encoded private key.
///
/// Returns the input URL with `signature=<sig>` appended.
///
/// # Errors
///
/// Returns [`ErrorKind::Configuration`] if the key is not valid URL-safe
/// base64 and [`ErrorKind::InvalidUrl`] if `url` cannot be parsed.
pub fn sign(url: &str, private_key: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ErrorKind::InvalidUrl(url.to_string(), e))?;
    let signature = signature(&parsed, private_key)?;
    let separator = if parsed.query().is_some() { '&' } else { '?' };
    Ok(format!("{url}{separator}signature={signature}"))
}

/// Compute the signature of `url` without modifying it.
///
/// # Errors
///
/// Returns [`ErrorKind::Configuration`] if the key cannot be decoded.
pub fn signature(url: &Url, private_key: &str) -> Result<String> {
    let key = decode_key(private_key)?;

    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| ErrorKind::config(format!("Invalid private key: {e}")))?;
    mac.update(url.path().as_bytes());
    mac.update(b"?");
    mac.update(url.query().unwrap_or_default().as_bytes());

    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Decode a URL-safe base64 private key, padded or not.
///
/// # Errors
///
/// Returns [`ErrorKind::Configuration`] if the key is not valid base64.
pub fn decode_key(private_key: &str) -> Result<Vec<u8>> {
    KEY_ENGINE
        .decode(private_key.trim())
        .map_err(|e| ErrorKind::config(format!("Cannot decode private key: {e}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const URL: &str = "https://maps.googleapis.com/maps/api/geocode/json?address=New+York&client=clientID";
    const KEY: &str = "vNIXE0xscrmjlyV-12Nj_BvUPaw=";

    #[test]
    fn test_known_signature() {
        assert_eq!(
            sign(URL, KEY).unwrap(),
            format!("{URL}&signature=chaRF2hTJKOScPr-RQCEhZbSzIE=")
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        assert_eq!(sign(URL, KEY).unwrap(), sign(URL, KEY).unwrap());
    }

    #[test]
    fn test_padding_is_optional() {
        assert_eq!(
            sign(URL, KEY).unwrap(),
            sign(URL, KEY.trim_end_matches('=')).unwrap()
        );
    }

    #[test]
    fn test_signature_depends_on_path_and_query() {
        let url = Url::parse(URL).unwrap();
        let other_host = Url::parse(
            "http://localhost:8080/maps/api/geocode/json?address=New+York&client=clientID",
        )
        .unwrap();
        let other_query =
            Url::parse("https://maps.googleapis.com/maps/api/geocode/json?address=Boston&client=clientID")
                .unwrap();

        assert_eq!(signature(&url, KEY).unwrap(), signature(&other_host, KEY).unwrap());
        assert_ne!(signature(&url, KEY).unwrap(), signature(&other_query, KEY).unwrap());
    }

    #[test]
    fn test_signature_depends_on_key() {
        let other_key = "AAAAAAAAAAAAAAAAAAAAAAAAAAA=";
        assert_ne!(sign(URL, KEY).unwrap(), sign(URL, other_key).unwrap());
    }

    #[test]
    fn test_invalid_key() {
        let err = sign(URL, "not base64 at all!").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_url_without_query() {
        let signed = sign("https://example.com/path", KEY).unwrap();
        assert!(signed.starts_with("https://example.com/path?signature="));
    }
}
