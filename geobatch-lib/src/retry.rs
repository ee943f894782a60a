use std::io;

use http::StatusCode;

/// An extension trait to help determine if a failed API call
/// is worth repeating.
///
/// Modified from `Retryable` in [reqwest-middleware].
///
/// [reqwest-middleware]: https://github.com/TrueLayer/reqwest-middleware/blob/f854725791ccf4a02c401a26cab3d9db753f468c/reqwest-retry/src/retryable.rs
pub(crate) trait RetryExt {
    fn should_retry(&self) -> bool;
}

impl RetryExt for StatusCode {
    /// Only rate limiting is retried on the status level. Any other
    /// unsuccessful status code is reported as-is.
    fn should_retry(&self) -> bool {
        *self == StatusCode::TOO_MANY_REQUESTS
    }
}

impl RetryExt for reqwest::Error {
    /// Transport failures (timeouts, refused or reset connections,
    /// interrupted bodies) are transient. Errors caused by the request
    /// itself are not.
    #[allow(clippy::if_same_then_else)]
    fn should_retry(&self) -> bool {
        if self.is_timeout() || self.is_connect() {
            true
        } else if self.is_builder() || self.is_redirect() || self.is_decode() {
            false
        } else if self.is_body() {
            true
        } else if self.is_request() {
            get_source_error_type::<io::Error>(self).is_none_or(should_retry_io)
        } else if let Some(status) = self.status() {
            status.should_retry()
        } else {
            false
        }
    }
}

/// Classifies an `io::Error` into retryable or not.
fn should_retry_io(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::TimedOut
    )
}

/// Downcasts the given err source into T.
fn get_source_error_type<T: std::error::Error + 'static>(
    err: &dyn std::error::Error,
) -> Option<&T> {
    let mut source = err.source();

    while let Some(err) = source {
        if let Some(typed) = err.downcast_ref::<T>() {
            return Some(typed);
        }

        source = err.source();
    }
    None
}
