//! Error types for FetchPager

use thiserror::Error;

/// Errors that can occur while running the fetch pipeline
///
/// Running out of content and failing to simplify HTML are not errors:
/// both are reported as content in the response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is malformed or not http/https
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// max_length or start_index out of bounds, or malformed arguments
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport failure: DNS, connect, timeout, or body read
    #[error("Failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Origin answered with a non-success status
    #[error("Failed to fetch {url} - status code {status}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Create a network error from a reqwest error
    pub fn from_reqwest(url: impl Into<String>, err: reqwest::Error) -> Self {
        FetchError::Network {
            url: url.into(),
            source: err,
        }
    }

    /// True for failures reaching the origin
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }

    /// Status code for HTTP-level failures
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
