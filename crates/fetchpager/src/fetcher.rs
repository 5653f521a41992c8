//! Network retrieval
//!
//! Design: the pipeline talks to a [`Fetcher`] trait object so callers can
//! inject their own transport. [`HttpFetcher`] is the reqwest-backed
//! implementation: one GET with a fixed identifying header, redirects
//! followed, and a capped streaming body read.

use crate::client::FetchOptions;
use crate::error::FetchError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use tracing::{debug, warn};
use url::Url;

/// Accept header sent with every request
const ACCEPT_VALUE: &str = "text/html, text/markdown, text/plain, */*;q=0.8";

/// A successfully retrieved resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedPayload {
    /// Response body, decoded as UTF-8 with invalid sequences replaced
    pub body: String,
    /// Content-Type of the final response; `None` when absent or empty
    pub content_type: Option<String>,
    /// HTTP status code of the final response
    pub status_code: u16,
    /// URL of the final response after redirects
    pub final_url: Url,
}

/// Trait for retrieving a resource
///
/// Implementations report transport failures as [`FetchError::Network`] and
/// non-success statuses as [`FetchError::HttpStatus`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Retrieve the resource at `url`
    async fn retrieve(&self, url: &Url) -> Result<RetrievedPayload, FetchError>;
}

/// HTTP fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher from options
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(crate::DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let redirect = if options.follow_redirects {
            Policy::limited(options.max_redirects)
        } else {
            Policy::none()
        };

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(redirect)
            .connect_timeout(options.timeout)
            .timeout(options.timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            max_body_bytes: options.max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn retrieve(&self, url: &Url) -> Result<RetrievedPayload, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().clone();
        if final_url != *url {
            debug!(from = %url, to = %final_url, "Followed redirect");
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let body = read_body_capped(response, self.max_body_bytes)
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        Ok(RetrievedPayload {
            body: String::from_utf8_lossy(&body).into_owned(),
            content_type,
            status_code: status.as_u16(),
            final_url,
        })
    }
}

/// Read the response body, keeping at most `max_bytes`
///
/// A cut that lands inside a multi-byte UTF-8 sequence is moved back to the
/// start of that sequence.
async fn read_body_capped(
    response: reqwest::Response,
    max_bytes: usize,
) -> Result<Bytes, reqwest::Error> {
    let mut body = BytesMut::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        let room = max_bytes.saturating_sub(body.len());
        if bytes.len() > room {
            body.extend_from_slice(&bytes[..room]);
            trim_partial_char(&mut body);
            warn!(max_bytes, "Response body exceeds limit, dropping the rest");
            break;
        }
        body.extend_from_slice(&bytes);
    }

    Ok(body.freeze())
}

/// Drop an incomplete UTF-8 sequence left at the end of a truncated body
fn trim_partial_char(body: &mut BytesMut) {
    if let Err(e) = std::str::from_utf8(&body[..]) {
        // `error_len() == None` means the input ended mid-sequence
        if e.error_len().is_none() {
            body.truncate(e.valid_up_to());
        }
    }
}
