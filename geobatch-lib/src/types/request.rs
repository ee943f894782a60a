use std::time::Instant;

use url::Url;

/// A fully authenticated request target.
///
/// Created right before a call is sent and dropped once the response has
/// been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Target URL, including credentials and (if signed) the signature
    pub url: Url,
    /// The URL signature; `None` when authenticating with an API key
    pub signature: Option<String>,
    /// When the request was authenticated
    pub issued_at: Instant,
}

impl SignedRequest {
    /// Wrap an already authenticated URL
    #[must_use]
    pub fn new(url: Url, signature: Option<String>) -> Self {
        Self {
            url,
            signature,
            issued_at: Instant::now(),
        }
    }
}
