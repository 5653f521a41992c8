//! Core types for FetchPager

use crate::error::FetchError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default window size in characters
pub const DEFAULT_MAX_LENGTH: usize = 5000;

/// Upper bound for `max_length`
pub const MAX_LENGTH_LIMIT: usize = 1_000_000;

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

/// Request to fetch one window of a URL's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FetchRequest {
    /// The URL to fetch (required, must be http:// or https://)
    pub url: String,

    /// Maximum number of characters to return (1 to 1000000, default 5000)
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Character offset to start from, for resuming a truncated fetch (default 0)
    #[serde(default)]
    pub start_index: usize,

    /// Return the content as-is, without HTML simplification (default false)
    #[serde(default)]
    pub raw: bool,
}

impl FetchRequest {
    /// Create a new request with the given URL and default window
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_length: DEFAULT_MAX_LENGTH,
            start_index: 0,
            raw: false,
        }
    }

    /// Set the window size
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the starting offset
    pub fn start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    /// Skip HTML simplification
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    /// Parse a request from tool-call arguments
    pub fn from_json(value: serde_json::Value) -> Result<Self, FetchError> {
        serde_json::from_value(value)
            .map_err(|e| FetchError::InvalidParameter(format!("invalid arguments: {}", e)))
    }

    /// Check bounds and parse the URL
    ///
    /// Runs before any rate limit slot or network call is spent.
    pub fn validate(&self) -> Result<Url, FetchError> {
        if self.url.is_empty() {
            return Err(FetchError::InvalidUrl("missing url".to_string()));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidUrl(format!(
                "{}: must start with http:// or https://",
                self.url
            )));
        }

        if self.max_length == 0 {
            return Err(FetchError::InvalidParameter(
                "max_length must be at least 1".to_string(),
            ));
        }
        if self.max_length > MAX_LENGTH_LIMIT {
            return Err(FetchError::InvalidParameter(format!(
                "max_length must be at most {}",
                MAX_LENGTH_LIMIT
            )));
        }

        Ok(url)
    }
}

/// How the returned content was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// HTML simplified to markdown
    Markdown,
    /// Body passed through unchanged
    Raw,
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentFormat::Markdown => write!(f, "markdown"),
            ContentFormat::Raw => write!(f, "raw"),
        }
    }
}

/// Response for one window of fetched content
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchResponse {
    /// The requested URL
    pub url: String,

    /// URL after redirects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Content format: "markdown" or "raw"
    pub format: ContentFormat,

    /// Notice shown ahead of content returned without conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,

    /// The window of content, followed by a continuation notice when more remains
    pub content: String,

    /// Length of the normalized content in characters
    pub total_length: usize,

    /// Offset this window starts at
    pub start_index: usize,

    /// Offset to request next, present only when more content remains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_index: Option<usize>,

    /// True if content remains past this window
    pub has_more: bool,

    /// True if start_index was at or past the end of the content
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_more_content: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let req = FetchRequest::new("https://example.com")
            .max_length(100)
            .start_index(20)
            .raw();

        assert_eq!(req.url, "https://example.com");
        assert_eq!(req.max_length, 100);
        assert_eq!(req.start_index, 20);
        assert!(req.raw);
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req = FetchRequest::from_json(json!({"url": "https://example.com"})).unwrap();
        assert_eq!(req.max_length, DEFAULT_MAX_LENGTH);
        assert_eq!(req.start_index, 0);
        assert!(!req.raw);
    }

    #[test]
    fn test_request_negative_start_index_rejected() {
        let err =
            FetchRequest::from_json(json!({"url": "https://example.com", "start_index": -1}))
                .unwrap_err();
        assert!(matches!(err, FetchError::InvalidParameter(_)));
    }

    #[test]
    fn test_request_missing_url_rejected() {
        let err = FetchRequest::from_json(json!({"max_length": 10})).unwrap_err();
        assert!(matches!(err, FetchError::InvalidParameter(_)));
    }

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(FetchRequest::new("http://example.com").validate().is_ok());
        assert!(FetchRequest::new("https://example.com/a?b=c").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        for url in ["", "ftp://example.com", "example.com", "file:///etc/passwd"] {
            let err = FetchRequest::new(url).validate().unwrap_err();
            assert!(matches!(err, FetchError::InvalidUrl(_)), "{}", url);
        }
    }

    #[test]
    fn test_validate_max_length_bounds() {
        let req = FetchRequest::new("https://example.com");
        assert!(matches!(
            req.clone().max_length(0).validate(),
            Err(FetchError::InvalidParameter(_))
        ));
        assert!(matches!(
            req.clone().max_length(MAX_LENGTH_LIMIT + 1).validate(),
            Err(FetchError::InvalidParameter(_))
        ));
        assert!(req.clone().max_length(1).validate().is_ok());
        assert!(req.max_length(MAX_LENGTH_LIMIT).validate().is_ok());
    }

    #[test]
    fn test_response_serialization() {
        let resp = FetchResponse {
            url: "https://example.com".to_string(),
            final_url: None,
            status_code: 200,
            content_type: None,
            format: ContentFormat::Markdown,
            notice: None,
            content: "Hello".to_string(),
            total_length: 5,
            start_index: 0,
            next_index: None,
            has_more: false,
            no_more_content: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        // Optional None fields should be omitted
        assert!(!json.contains("content_type"));
        assert!(!json.contains("next_index"));
        assert!(!json.contains("no_more_content"));
        assert!(!json.contains("notice"));
        assert!(json.contains("\"format\":\"markdown\""));
        assert!(json.contains("\"content\":\"Hello\""));
    }
}
