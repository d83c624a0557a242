//! Blocking fetch utilities.
//!
//! Provides simple blocking HTTP GET wrappers and `data:` URL decoding used by
//! the image cache. The core styling pipeline never calls these directly; they
//! back the drawing backend's `fetch_and_cache` operation.

use base64::Engine;
use std::time::Duration;
use thiserror::Error;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("quire/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const TIMEOUT: Duration = Duration::from_secs(30);

/// Failure while fetching a remote or inline resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The request could not be sent or timed out.
    #[error("request to '{url}' failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("HTTP error {status} for '{url}'")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },
    /// The response body could not be read.
    #[error("failed to read response body of '{url}': {source}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// A `data:` URL was malformed or used an unsupported encoding.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
    /// Reading or writing the local cache failed.
    #[error("cache I/O error on '{path}': {source}")]
    Io {
        /// File that was being accessed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A parsed `data:` URL that can be decoded into raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// The full raw `data:` URL string (e.g. `data:image/png;base64,...`).
    pub raw_data: String,
}

impl DataUrl {
    /// Create a new `DataUrl` from a raw data URL string.
    #[must_use]
    pub const fn new(raw_data: String) -> Self {
        Self { raw_data }
    }

    /// The media type declared before the payload, e.g. `image/png`.
    #[must_use]
    pub fn media_type(&self) -> &str {
        let meta = self
            .raw_data
            .trim_start_matches("data:")
            .split(',')
            .next()
            .unwrap_or_default();
        meta.split(';').next().unwrap_or_default()
    }

    /// Decode the data URL payload into raw bytes.
    ///
    /// Base64 payloads are decoded; plain payloads are returned as their
    /// UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUrl`] if the URL has no `,` separator or
    /// the base64 payload is invalid.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        let data_url = self.raw_data.trim_start_matches("data:");
        let Some((metadata, data)) = data_url.split_once(',') else {
            return Err(FetchError::DataUrl("missing comma".to_string()));
        };

        if metadata.ends_with(";base64") {
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| FetchError::DataUrl(format!("base64 decode error: {e}")))
        } else {
            Ok(data.as_bytes().to_vec())
        }
    }
}

/// Fetch a URL and return its body as raw bytes.
///
/// Blocks the calling thread until the response arrives or [`TIMEOUT`]
/// elapses. No retries are attempted.
///
/// # Errors
///
/// Returns a [`FetchError`] if the client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be read.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(FetchError::Client)?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
}

/// Whether `url` names a remote resource that needs an HTTP fetch.
#[must_use]
pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_data_url() {
        let url = DataUrl::new("data:text/plain;base64,cXVpcmU=".to_string());
        assert_eq!(url.media_type(), "text/plain");
        assert_eq!(url.decode().unwrap(), b"quire");
    }

    #[test]
    fn test_decode_plain_data_url() {
        let url = DataUrl::new("data:text/plain,hello".to_string());
        assert_eq!(url.decode().unwrap(), b"hello");
    }

    #[test]
    fn test_decode_missing_comma() {
        let url = DataUrl::new("data:text/plain;base64".to_string());
        assert!(matches!(url.decode(), Err(FetchError::DataUrl(_))));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(!is_remote("images/a.png"));
        assert!(!is_remote("data:image/png;base64,AAAA"));
    }
}
