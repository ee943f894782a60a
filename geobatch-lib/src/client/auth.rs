use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{ErrorKind, Result, SignedRequest, signer};

/// How requests authenticate against the API.
///
/// Chosen once when the [`Client`](crate::Client) is built. A client ID
/// together with a private key takes precedence over an API key.
#[derive(Debug, Clone)]
pub enum Auth {
    /// Plain API key, sent as the `key` query parameter
    ApiKey(SecretString),
    /// Premium plan client ID with URL signing
    Signed {
        /// Client ID, sent as the `client` query parameter
        client_id: String,
        /// URL-safe base64 encoded signing key
        private_key: SecretString,
        /// Usage reporting channel; omitted when empty
        channel: String,
    },
}

impl Auth {
    /// Pick the authentication mode from the available credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] if neither an API key nor a
    /// complete client ID and private key pair is given, or if the private
    /// key is not valid URL-safe base64.
    pub fn from_credentials(
        api_key: Option<SecretString>,
        client_id: Option<String>,
        private_key: Option<SecretString>,
        channel: String,
    ) -> Result<Self> {
        let client_id = client_id.filter(|id| !id.trim().is_empty());
        let private_key = private_key.filter(|key| !key.expose_secret().trim().is_empty());

        match (client_id, private_key) {
            (Some(client_id), Some(private_key)) => {
                signer::decode_key(private_key.expose_secret())?;
                Ok(Self::Signed {
                    client_id,
                    private_key,
                    channel,
                })
            }
            (client_id, private_key) => {
                match api_key.filter(|key| !key.expose_secret().trim().is_empty()) {
                    Some(key) => {
                        if client_id.is_some() != private_key.is_some() {
                            log::warn!(
                                "Client ID and private key must be set together for URL signing. Falling back to API key."
                            );
                        }
                        Ok(Self::ApiKey(key))
                    }
                    None => Err(ErrorKind::config(
                        "No credentials found. Provide an API key (`GOOGLE_API_KEY`) or a client ID and private key (`GOOGLE_CLIENT_ID`, `GOOGLE_MAPS_PRIVATE_KEY`)",
                    )),
                }
            }
        }
    }

    /// Returns `true` if requests are signed
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Signed { .. })
    }

    /// Add credentials (and, if applicable, the signature) to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] if the URL cannot be signed.
    pub fn authorize(&self, mut url: Url) -> Result<SignedRequest> {
        match self {
            Self::ApiKey(key) => {
                url.query_pairs_mut()
                    .append_pair("key", key.expose_secret());
                Ok(SignedRequest::new(url, None))
            }
            Self::Signed {
                client_id,
                private_key,
                channel,
            } => {
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair("client", client_id);
                    if !channel.is_empty() {
                        query.append_pair("channel", channel);
                    }
                }
                let signature = signer::signature(&url, private_key.expose_secret())?;
                let query = format!(
                    "{}&signature={signature}",
                    url.query().unwrap_or_default()
                );
                url.set_query(Some(&query));
                Ok(SignedRequest::new(url, Some(signature)))
            }
        }
    }
}
