//! Handler of geocoding and address validation requests.
//!
//! This module defines two structs, [`Client`] and [`ClientBuilder`].
//! `Client` sends one request per address and normalizes the response.
//! `ClientBuilder` exposes a finer level of granularity for building
//! a `Client`.
//!
//! The [`Executor`] trait is the seam between the batch machinery and the
//! network: [`BatchDispatcher`](crate::BatchDispatcher) only ever talks to
//! an `Executor`, which makes it easy to swap in a fake for tests.
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::used_underscore_binding
)]
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use http::StatusCode;
use log::{debug, error, info, warn};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};
use tokio::time::sleep;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    AddressRecord, ApiResult, ApiStatus, ErrorKind, RateLimiter, Result, RowId, SignedRequest,
    ratelimit::RateLimitConfig, retry::RetryExt,
};

mod auth;
mod response;

pub use auth::Auth;
pub(crate) use response::error_message;

/// Sample address resolved by [`Client::check_connection`]
pub const CONNECTION_CHECK_ADDRESS: &str = "London, England";
const CONNECTION_CHECK_REGION: &str = "GB";

/// Default number of attempts before a request is deemed as failed, 3.
pub const DEFAULT_MAX_RETRIES: u64 = 3;
/// Default base wait time between attempts, 100ms.
///
/// The wait grows linearly: `n * retry_wait_time` before attempt `n + 1`.
pub const DEFAULT_RETRY_WAIT_TIME: Duration = Duration::from_millis(100);
/// Default number of re-sends of a rate limited (429) request, 3.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;
/// Default base wait time for rate limited requests, 1s.
///
/// The wait doubles with every re-send: 2s, 4s, 8s.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);
/// Default timeout in seconds before a request is deemed as failed, 30.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default usage reporting channel for signed requests.
pub const DEFAULT_CHANNEL: &str = "geocoder";
/// Default user agent, `geobatch-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("geobatch/", env!("CARGO_PKG_VERSION"));
/// Geocoding API endpoint
pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
/// Address Validation API endpoint
pub const VALIDATION_URL: &str = "https://addressvalidation.googleapis.com/v1:validateAddress";

// Constants currently not configurable by the user.
/// A timeout for only the connect phase of a Client.
const CONNECT_TIMEOUT: u64 = 10;
/// TCP keepalive
/// See <https://tldp.org/HOWTO/TCP-Keepalive-HOWTO/overview.html> for more info
const TCP_KEEPALIVE: u64 = 60;

/// Which API to send addresses to
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ApiMode {
    /// Geocoding API (`GET`, address as query parameter)
    Geocode,
    /// Address Validation API (`POST`, address in a JSON body)
    #[default]
    Validate,
}

impl ApiMode {
    /// The public endpoint for this mode
    #[must_use]
    pub const fn default_url(self) -> &'static str {
        match self {
            Self::Geocode => GEOCODE_URL,
            Self::Validate => VALIDATION_URL,
        }
    }
}

/// Request body of the Address Validation API
#[derive(Debug, Serialize)]
struct ValidationRequest<'a> {
    address: PostalAddressInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostalAddressInput<'a> {
    address_lines: [&'a str; 1],
    region_code: &'a str,
}

impl<'a> From<&'a AddressRecord> for ValidationRequest<'a> {
    fn from(record: &'a AddressRecord) -> Self {
        Self {
            address: PostalAddressInput {
                address_lines: [&record.address],
                region_code: &record.region_code,
            },
        }
    }
}

/// Resolves a single address.
///
/// Implementations must produce exactly one [`ApiResult`] per call.
/// Expected failures (nothing found, HTTP errors) are reported through
/// [`ApiResult::status`]; an `Err` means the call could not be completed at
/// all.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Resolve one address
    async fn execute(&self, record: &AddressRecord) -> Result<ApiResult>;
}

/// Builder for [`Client`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `ClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ClientBuilder`.
"))]
pub struct ClientBuilder {
    /// API key, used unless a client ID and private key are given.
    api_key: Option<SecretString>,

    /// Client ID for URL signing.
    client_id: Option<String>,

    /// URL-safe base64 encoded private key for URL signing.
    private_key: Option<SecretString>,

    /// Usage reporting channel, only sent with signed requests.
    #[builder(default = DEFAULT_CHANNEL.to_string())]
    channel: String,

    /// Which API to call.
    mode: ApiMode,

    /// Endpoint override, e.g. for a proxy or a mock server.
    ///
    /// Defaults to the public endpoint of [`ClientBuilder::mode`].
    base_url: Option<Url>,

    /// Maximum number of network attempts per address.
    ///
    /// Only transport failures (timeouts, connection errors) count as
    /// attempts. Rate limited responses are re-sent within an attempt.
    #[builder(default = DEFAULT_MAX_RETRIES)]
    max_retries: u64,

    /// Base wait time between attempts after a transport failure.
    ///
    /// The wait time grows linearly with the attempt number.
    retry_wait_time: Option<Duration>,

    /// Maximum number of re-sends of a `429 Too Many Requests` response.
    #[builder(default = DEFAULT_MAX_RATE_LIMIT_RETRIES)]
    max_rate_limit_retries: u32,

    /// Base wait time after a `429 Too Many Requests` response.
    ///
    /// The wait time doubles with every re-send, starting at twice this
    /// value.
    rate_limit_backoff: Option<Duration>,

    /// Response timeout per request.
    timeout: Option<Duration>,

    /// User agent sent with every request.
    #[builder(default = DEFAULT_USER_AGENT.to_string())]
    user_agent: String,

    /// Limiter shared with other clients.
    ///
    /// A new limiter with the default rate is created if none is given.
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl Default for ClientBuilder {
    #[must_use]
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientBuilder {
    /// Instantiates a [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - No usable credentials are configured.
    /// - The private key is not valid URL-safe base64.
    /// - `max_retries` is zero.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn client(self) -> Result<Client> {
        let Self {
            api_key,
            client_id,
            private_key,
            channel,
            mode,
            base_url,
            max_retries,
            retry_wait_time,
            max_rate_limit_retries,
            rate_limit_backoff,
            timeout,
            user_agent,
            rate_limiter,
        } = self;

        let auth = Auth::from_credentials(api_key, client_id, private_key, channel)?;

        if max_retries == 0 {
            return Err(ErrorKind::config("max retries must be at least 1"));
        }

        let base_url = match base_url {
            Some(url) => url,
            None => {
                let url = mode.default_url();
                Url::parse(url).map_err(|e| ErrorKind::InvalidUrl(url.to_string(), e))?
            }
        };

        let rate_limiter = match rate_limiter {
            Some(limiter) => limiter,
            None => Arc::new(RateLimiter::from_config(RateLimitConfig::default())?),
        };

        let reqwest_client = reqwest::ClientBuilder::new()
            .gzip(true)
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE))
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;

        debug!(
            "Using {mode} API at {base_url} ({} auth)",
            if auth.is_signed() { "signed URL" } else { "API key" }
        );

        Ok(Client {
            reqwest_client,
            auth,
            mode,
            base_url,
            rate_limiter,
            max_retries,
            retry_wait_time: retry_wait_time.unwrap_or(DEFAULT_RETRY_WAIT_TIME),
            max_rate_limit_retries,
            rate_limit_backoff: rate_limit_backoff.unwrap_or(DEFAULT_RATE_LIMIT_BACKOFF),
        })
    }
}

/// Handles incoming address records and returns normalized results.
///
/// See [`ClientBuilder`] which contains sane defaults for all configuration
/// options.
#[derive(Debug, Clone)]
pub struct Client {
    /// Underlying `reqwest` client instance that handles the HTTP requests.
    reqwest_client: reqwest::Client,

    /// How requests authenticate.
    auth: Auth,

    mode: ApiMode,

    base_url: Url,

    /// Paces every network attempt, retries included.
    rate_limiter: Arc<RateLimiter>,

    max_retries: u64,

    retry_wait_time: Duration,

    max_rate_limit_retries: u32,

    rate_limit_backoff: Duration,
}

impl Client {
    /// The API this client talks to
    #[must_use]
    pub const fn mode(&self) -> ApiMode {
        self.mode
    }

    /// The limiter pacing this client's requests
    #[must_use]
    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Resolve a single address.
    ///
    /// Blank addresses are answered locally without a request.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ApiRequest`] if every attempt failed on the
    /// transport level and [`ErrorKind::ValidationApi`] if a successful
    /// response carries an unusable body.
    pub async fn execute(&self, record: &AddressRecord) -> Result<ApiResult> {
        if record.is_empty() {
            return Ok(ApiResult::empty_address(record.row_id));
        }

        let request = self.auth.authorize(self.request_url(record))?;
        let (status, body) = self.retry_request(&request, record).await?;

        if !status.is_success() {
            error!("{record}: HTTP Error {}: {body}", status.as_u16());
            let raw = http_error_body(status, &body);
            return Ok(ApiResult::http_error(record.row_id, status.as_u16()).with_raw(raw));
        }

        response::normalize(self.mode, record.row_id, &body)
    }

    /// Resolve a sample address to make sure that the credentials are
    /// accepted and the API is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConnectionCheck`] unless the API resolves the
    /// sample address.
    pub async fn check_connection(&self) -> Result<ApiResult> {
        let record = AddressRecord::new(
            RowId::new(0),
            CONNECTION_CHECK_ADDRESS,
            CONNECTION_CHECK_REGION,
        );
        let result = self
            .execute(&record)
            .await
            .map_err(|e| ErrorKind::ConnectionCheck(e.to_string()))?;
        if result.status != ApiStatus::Ok {
            let reason = result
                .error
                .clone()
                .unwrap_or_else(|| result.status.to_string());
            return Err(ErrorKind::ConnectionCheck(reason));
        }
        info!("API connection successful");
        Ok(result)
    }

    /// The unauthenticated URL for `record`
    fn request_url(&self, record: &AddressRecord) -> Url {
        let mut url = self.base_url.clone();
        if self.mode == ApiMode::Geocode {
            url.query_pairs_mut().append_pair("address", &record.address);
        }
        url
    }

    /// Send a request up to `max_retries` times, waiting a linearly growing
    /// time between attempts.
    async fn retry_request(
        &self,
        request: &SignedRequest,
        record: &AddressRecord,
    ) -> Result<(StatusCode, String)> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.send_attempt(request, record).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && e.should_retry() => {
                    let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
                    let wait_time = self.retry_wait_time.saturating_mul(factor);
                    warn!(
                        "{record}: attempt {attempt}/{} failed: {e}. Retrying in {wait_time:?}",
                        self.max_retries
                    );
                    sleep(wait_time).await;
                }
                Err(source) => {
                    return Err(ErrorKind::ApiRequest {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// A single attempt: one send, plus re-sends with an exponential backoff
    /// for as long as the API reports rate limiting and the re-send budget
    /// lasts. The last response is returned as-is.
    async fn send_attempt(
        &self,
        request: &SignedRequest,
        record: &AddressRecord,
    ) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        let mut rate_limit_retries: u32 = 0;
        loop {
            self.rate_limiter.acquire().await;
            let response = self.build_request(request, record).send().await?;
            let status = response.status();

            if status.should_retry() && rate_limit_retries < self.max_rate_limit_retries {
                rate_limit_retries += 1;
                let wait_time = self
                    .rate_limit_backoff
                    .saturating_mul(2_u32.saturating_pow(rate_limit_retries));
                warn!("{record}: rate limited by the API. Waiting {wait_time:?}");
                sleep(wait_time).await;
                continue;
            }

            let body = response.text().await?;
            return Ok((status, body));
        }
    }

    fn build_request(
        &self,
        request: &SignedRequest,
        record: &AddressRecord,
    ) -> reqwest::RequestBuilder {
        match self.mode {
            ApiMode::Geocode => self.reqwest_client.get(request.url.clone()),
            ApiMode::Validate => self
                .reqwest_client
                .post(request.url.clone())
                .json(&ValidationRequest::from(record)),
        }
    }
}

#[async_trait]
impl Executor for Client {
    async fn execute(&self, record: &AddressRecord) -> Result<ApiResult> {
        Client::execute(self, record).await
    }
}

/// The `api_response` of a non-2xx answer; keeps the body the API sent along
fn http_error_body(status: StatusCode, body: &str) -> serde_json::Value {
    let mut raw = serde_json::json!({ "error": format!("HTTP Error: {}", status.as_u16()) });
    if !body.trim().is_empty() {
        raw["body"] = serde_json::Value::from(body.trim());
    }
    raw
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_utils::{fixtures_path, load_fixture, load_json_fixture, mock_server};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, query_param},
    };

    use super::*;
    use crate::{ApiStatus, RowId};

    fn record(address: &str) -> AddressRecord {
        AddressRecord::new(RowId::new(0), address, "US")
    }

    fn builder(server: &MockServer, mode: ApiMode) -> ClientBuilder {
        ClientBuilder::builder()
            .api_key(SecretString::from("test-key".to_owned()))
            .mode(mode)
            .base_url(Url::parse(&server.uri()).unwrap())
            .retry_wait_time(Duration::from_millis(1))
            .rate_limit_backoff(Duration::from_millis(1))
            .rate_limiter(Arc::new(RateLimiter::with_interval(Duration::ZERO)))
            .build()
    }

    fn geocode_ok() -> serde_json::Value {
        json!({
            "status": "OK",
            "results": [{
                "formatted_address": "1 Main St, Springfield, USA",
                "geometry": {"location": {"lat": 1.0, "lng": 2.0}, "location_type": "ROOFTOP"},
                "place_id": "place-1",
                "types": ["street_address"]
            }]
        })
    }

    #[test]
    fn test_missing_credentials() {
        let err = ClientBuilder::default().client().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let err = ClientBuilder::builder()
            .api_key(SecretString::from("key".to_owned()))
            .max_retries(0_u64)
            .build()
            .client()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validation_request_body() {
        let record = AddressRecord::new(RowId::new(0), "1 Main St", "DE");
        assert_eq!(
            serde_json::to_value(ValidationRequest::from(&record)).unwrap(),
            json!({"address": {"addressLines": ["1 Main St"], "regionCode": "DE"}})
        );
    }

    #[tokio::test]
    async fn test_geocode_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("address", "1 Main St"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        assert_eq!(result.status, ApiStatus::Ok);
        assert_eq!(result.place_id.as_deref(), Some("place-1"));
    }

    #[tokio::test]
    async fn test_validation_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "address": {"addressLines": ["1 Main St"], "regionCode": "US"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "verdict": {"addressComplete": true},
                    "address": {"formattedAddress": "1 Main St"},
                    "geocode": {"placeId": "abc"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Validate).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        assert_eq!(result.status, ApiStatus::Ok);
        assert_eq!(result.formatted_address.as_deref(), Some("1 Main St"));
        assert!(result.raw.is_some());
    }

    #[tokio::test]
    async fn test_signed_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("client", "clientID"))
            .and(query_param("channel", "geocoder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClientBuilder::builder()
            .client_id("clientID".to_string())
            .private_key(SecretString::from("vNIXE0xscrmjlyV-12Nj_BvUPaw=".to_owned()))
            .mode(ApiMode::Geocode)
            .base_url(Url::parse(&server.uri()).unwrap())
            .build()
            .client()
            .unwrap();
        let result = client.execute(&record("New York")).await.unwrap();
        assert_eq!(result.status, ApiStatus::Ok);

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap().to_string();
        assert!(query.contains("&signature="), "{query}");
        assert!(!query.contains("key="), "{query}");
    }

    #[tokio::test]
    async fn test_rate_limited_then_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::TOO_MANY_REQUESTS.as_u16()))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        assert_eq!(result.status, ApiStatus::Ok);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert_eq!(client.rate_limiter().permits_granted(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        // One send plus three re-sends, then the last response is used as-is
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
        assert_eq!(result.status, ApiStatus::HttpError(429));
        assert_eq!(result.error.as_deref(), Some("HTTP Error: 429"));
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        assert_eq!(result.status, ApiStatus::HttpError(500));
        assert_eq!(
            result.raw,
            Some(json!({"error": "HTTP Error: 500"}))
        );
    }

    #[tokio::test]
    async fn test_http_error_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403).set_body_string("The provided API key is invalid.\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("1 Main St")).await.unwrap();

        assert_eq!(result.status, ApiStatus::HttpError(403));
        assert_eq!(
            result.raw,
            Some(json!({
                "error": "HTTP Error: 403",
                "body": "The provided API key is invalid."
            }))
        );
    }

    #[tokio::test]
    async fn test_check_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("address", CONNECTION_CHECK_ADDRESS))
            .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
            .expect(1)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.check_connection().await.unwrap();
        assert_eq!(result.status, ApiStatus::Ok);
    }

    #[tokio::test]
    async fn test_check_connection_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "results": []
            })))
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let err = client.check_connection().await.unwrap_err();
        assert!(matches!(err, ErrorKind::ConnectionCheck(_)), "{err}");
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(geocode_ok())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ClientBuilder::builder()
            .api_key(SecretString::from("test-key".to_owned()))
            .mode(ApiMode::Geocode)
            .base_url(Url::parse(&server.uri()).unwrap())
            .timeout(Duration::from_millis(20))
            .max_retries(3_u64)
            .retry_wait_time(Duration::from_millis(1))
            .build()
            .client()
            .unwrap();

        let err = client.execute(&record("1 Main St")).await.unwrap_err();

        assert!(
            matches!(err, ErrorKind::ApiRequest { attempts: 3, .. }),
            "{err:?}"
        );
        assert!(err.reqwest_error().is_some_and(reqwest::Error::is_timeout));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unusable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let err = client.execute(&record("1 Main St")).await.unwrap_err();
        assert!(matches!(err, ErrorKind::ValidationApi(_)));
    }

    #[tokio::test]
    async fn test_empty_address_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = builder(&server, ApiMode::Geocode).client().unwrap();
        let result = client.execute(&record("   ")).await.unwrap();
        assert_eq!(result.status, ApiStatus::EmptyAddress);
    }

    #[tokio::test]
    async fn test_requests_are_paced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(geocode_ok()))
            .mount(&server)
            .await;

        let client = ClientBuilder::builder()
            .api_key(SecretString::from("test-key".to_owned()))
            .mode(ApiMode::Geocode)
            .base_url(Url::parse(&server.uri()).unwrap())
            .rate_limiter(Arc::new(RateLimiter::new(20.0).unwrap()))
            .build()
            .client()
            .unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            client.execute(&record("1 Main St")).await.unwrap();
        }
        // Three permits at 50ms spacing
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_recorded_validation_response() {
        let body = load_json_fixture!("validation_ok.json");
        let server = mock_server!(200, set_body_json(body.clone()));

        let client = builder(&server, ApiMode::Validate).client().unwrap();
        let result = client
            .execute(&record("1600 Amphitheatre Pkwy"))
            .await
            .unwrap();

        assert_eq!(result.postal_code.as_deref(), Some("94043-1351"));
        assert_eq!(result.latitude, Some(37.422_502_2));
        assert_eq!(result.types_joined(), "premise");
        assert_eq!(result.raw, Some(body));
    }
}
