//! Network access for revocation data: CRL downloads and OCSP exchanges.

pub mod cache;
pub mod config;
pub mod http;
pub mod retry;

use snafu::{Location, Snafu};
use std::time::Duration;

pub use cache::CachingFetcher;
pub use config::FetchConfig;
pub use http::HttpFetcher;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum FetchError {
    #[snafu(display("Transport error for {uri}"))]
    Transport {
        uri: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Timed out fetching {uri}"))]
    Timeout {
        uri: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("HTTP status {status} from {uri}"))]
    HttpStatus {
        uri: String,
        status: u16,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Unsupported URI scheme: {uri}"))]
    UnsupportedScheme {
        uri: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Recent fetch of {uri} failed: {message}"))]
    CachedFailure {
        uri: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Retry budget of {configured:?} exhausted for {uri} after {elapsed:?}"))]
    DeadlineExceeded {
        uri: String,
        configured: Duration,
        elapsed: Duration,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to build HTTP client"))]
    ClientBuild {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to start the fetch runtime"))]
    Runtime {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Cache lock poisoned: {message}"))]
    MutexPoisoned {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl FetchError {
    /// Whether the failure came from the network rather than from local
    /// setup or an unsupported location.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. }
                | FetchError::Timeout { .. }
                | FetchError::HttpStatus { .. }
                | FetchError::CachedFailure { .. }
                | FetchError::DeadlineExceeded { .. }
        )
    }
}

/// Validators from an earlier response, sent on revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditional {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Conditional {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    Body {
        bytes: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    NotModified,
}

/// Resolves revocation-data URIs to bytes. Implementations are blocking.
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    fn get(&self, uri: &str, conditional: &Conditional) -> Result<FetchResponse, FetchError>;

    fn post(&self, uri: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>, FetchError>;

    /// Unconditional GET returning the body.
    fn get_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        match self.get(uri, &Conditional::default())? {
            FetchResponse::Body { bytes, .. } => Ok(bytes),
            // Only possible when a conditional was sent.
            FetchResponse::NotModified => Ok(Vec::new()),
        }
    }
}
