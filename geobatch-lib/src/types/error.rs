use serde::{Serialize, Serializer};
use std::hash::Hash;
use std::path::PathBuf;
use thiserror::Error;

/// Possible errors when running a batch with `geobatch_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Missing or invalid settings (credentials, batch sizes, rates).
    ///
    /// Always raised before any network activity takes place.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required input columns are missing
    #[error("{message}. Available columns: {}", available.join(", "))]
    MissingColumns {
        /// Description of what was expected
        message: String,
        /// Header names found in the input
        available: Vec<String>,
    },

    /// The input or output CSV data cannot be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Every attempt to reach the API failed on the transport level
    #[error("API request failed after {attempts} attempt(s): {source}")]
    ApiRequest {
        /// Number of network attempts made
        attempts: u64,
        /// Error of the final attempt
        #[source]
        source: reqwest::Error,
    },

    /// The API answered, but the payload cannot be used
    #[error("Unusable API response: {0}")]
    ValidationApi(String),

    /// The sample request sent before a run did not succeed
    #[error("Connection check failed: {0}. Check your credentials and network connection")]
    ConnectionCheck(String),

    /// The HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    BuildRequestClient(#[source] reqwest::Error),

    /// A configured endpoint is not a valid URL
    #[error("Cannot parse `{0}` as URL: {1}")]
    InvalidUrl(String, #[source] url::ParseError),

    /// Any form of I/O error occurred while reading from or writing to a path.
    #[error("Failed to access path: `{}`, reason: {}", match .0 {
        Some(p) => p.to_str().unwrap_or("<MALFORMED PATH>"),
        None => "<MALFORMED PATH>",
    }, .1)]
    IoError(Option<PathBuf>, std::io::Error),

    /// Failed to serialize a value to JSON
    #[error("Cannot serialize value as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorKind {
    /// Returns `true` if the error is caused by invalid settings rather than
    /// by the data or the remote API.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidUrl(..))
    }

    /// Return the underlying `reqwest` error, if any
    #[must_use]
    pub const fn reqwest_error(&self) -> Option<&reqwest::Error> {
        match self {
            Self::ApiRequest { source, .. } | Self::BuildRequestClient(source) => Some(source),
            _ => None,
        }
    }

    /// Shorthand for a [`ErrorKind::Configuration`] error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Configuration(a), Self::Configuration(b))
            | (Self::ValidationApi(a), Self::ValidationApi(b))
            | (Self::ConnectionCheck(a), Self::ConnectionCheck(b)) => a == b,
            (
                Self::MissingColumns {
                    message: m1,
                    available: a1,
                },
                Self::MissingColumns {
                    message: m2,
                    available: a2,
                },
            ) => m1 == m2 && a1 == a2,
            (
                Self::ApiRequest {
                    attempts: n1,
                    source: e1,
                },
                Self::ApiRequest {
                    attempts: n2,
                    source: e2,
                },
            ) => n1 == n2 && e1.to_string() == e2.to_string(),
            (Self::IoError(p1, e1), Self::IoError(p2, e2)) => p1 == p2 && e1.kind() == e2.kind(),
            (Self::InvalidUrl(u1, e1), Self::InvalidUrl(u2, e2)) => u1 == u2 && e1 == e2,
            (Self::Csv(e1), Self::Csv(e2)) => e1.to_string() == e2.to_string(),
            (Self::BuildRequestClient(e1), Self::BuildRequestClient(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (Self::Json(e1), Self::Json(e2)) => e1.to_string() == e2.to_string(),
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        match self {
            Self::Configuration(s) | Self::ValidationApi(s) | Self::ConnectionCheck(s) => {
                s.hash(state);
            }
            Self::MissingColumns { message, available } => (message, available).hash(state),
            Self::ApiRequest { attempts, source } => (attempts, source.to_string()).hash(state),
            Self::IoError(p, e) => (p, e.kind()).hash(state),
            Self::InvalidUrl(u, e) => (u, e.to_string()).hash(state),
            Self::Csv(e) => e.to_string().hash(state),
            Self::BuildRequestClient(e) => e.to_string().hash(state),
            Self::Json(e) => e.to_string().hash(state),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<(PathBuf, std::io::Error)> for ErrorKind {
    fn from(value: (PathBuf, std::io::Error)) -> Self {
        Self::IoError(Some(value.0), value.1)
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(None, e)
    }
}

impl From<tokio::task::JoinError> for ErrorKind {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::IoError(None, e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn test_missing_columns_lists_available_headers() {
        let err = ErrorKind::MissingColumns {
            message: "Column `Address` not found".into(),
            available: vec!["Street".into(), "Town".into()],
        };
        assert_eq!(
            err.to_string(),
            "Column `Address` not found. Available columns: Street, Town"
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert!(ErrorKind::config("no credentials").is_configuration());
        assert!(!ErrorKind::ValidationApi("garbage".into()).is_configuration());
        assert_eq!(
            ErrorKind::config("batch size must be positive"),
            ErrorKind::Configuration("batch size must be positive".into())
        );
    }
}
