//! Fetch pipeline for FetchPager
//!
//! [`FetchClient`] runs one request end to end:
//! validate → rate limit → retrieve → classify → normalize → paginate.
//! Validation happens first so malformed input never spends a rate limit
//! slot or a network call.

use crate::cache::ContentCache;
use crate::classify::classify;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, RetrievedPayload};
use crate::normalize::{normalize, NormalizedContent};
use crate::paginate::{paginate, Page};
use crate::rate_limit::OriginLimiters;
use crate::tool::ToolStatus;
use crate::types::{FetchRequest, FetchResponse};
use crate::DEFAULT_USER_AGENT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default redirect limit
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default cap on body size
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Transport options for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Total request timeout, reported as a network error when exceeded
    pub timeout: Duration,
    /// Follow redirects
    pub follow_redirects: bool,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Bytes of body kept; the rest is dropped
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// A retrieved and normalized document, before pagination
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub final_url: String,
    pub content: NormalizedContent,
}

impl FetchedDocument {
    pub fn new(payload: &RetrievedPayload, content: NormalizedContent) -> Self {
        Self {
            status_code: payload.status_code,
            content_type: payload.content_type.clone(),
            final_url: payload.final_url.to_string(),
            content,
        }
    }
}

/// Runs the fetch pipeline against an injected fetcher and rate limiters
pub struct FetchClient {
    fetcher: Arc<dyn Fetcher>,
    limiters: Arc<OriginLimiters>,
    cache: Option<Arc<ContentCache>>,
}

impl FetchClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, limiters: Arc<OriginLimiters>) -> Self {
        Self {
            fetcher,
            limiters,
            cache: None,
        }
    }

    /// Serve repeated `(url, raw)` requests from `cache`
    pub fn with_cache(mut self, cache: Arc<ContentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn limiters(&self) -> &Arc<OriginLimiters> {
        &self.limiters
    }

    pub fn cache(&self) -> Option<&Arc<ContentCache>> {
        self.cache.as_ref()
    }

    /// Fetch one window of content
    pub async fn execute(&self, req: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.execute_with_status(req, |_| {}).await
    }

    /// Fetch one window of content, reporting each phase
    pub async fn execute_with_status<F>(
        &self,
        req: &FetchRequest,
        mut status_callback: F,
    ) -> Result<FetchResponse, FetchError>
    where
        F: FnMut(ToolStatus),
    {
        status_callback(ToolStatus::new("validate").with_percent(0.0));
        let url = req.validate()?;

        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(url.as_str(), req.raw));

        let document = match cached {
            Some(document) => {
                debug!(url = %url, raw = req.raw, "Serving from cache");
                document
            }
            None => {
                status_callback(ToolStatus::new("rate_limit").with_percent(10.0));
                let limiter = self.limiters.limiter_for(&url);
                limiter.acquire().await;

                status_callback(
                    ToolStatus::new("fetch")
                        .with_message(url.as_str())
                        .with_percent(20.0),
                );
                debug!(fetcher = self.fetcher.name(), url = %url, "Retrieving");
                let payload = self.fetcher.retrieve(&url).await?;

                status_callback(ToolStatus::new("convert").with_percent(70.0));
                let classification = classify(&payload);
                debug!(
                    url = %url,
                    is_html = classification.is_html,
                    content_type = payload.content_type.as_deref().unwrap_or(""),
                    "Classified payload"
                );
                let content = normalize(&payload, classification, req.raw);
                info!(
                    url = %url,
                    status = payload.status_code,
                    length = content.length(),
                    "Fetched content"
                );

                let document = Arc::new(FetchedDocument::new(&payload, content));
                if let Some(cache) = &self.cache {
                    cache.insert(url.as_str(), req.raw, document.clone());
                }
                document
            }
        };

        status_callback(ToolStatus::new("paginate").with_percent(90.0));
        let page = paginate(
            document.content.text(),
            document.content.length(),
            req.start_index,
            req.max_length,
        );
        let response = build_response(req, &document, &page);

        status_callback(ToolStatus::new("complete").with_percent(100.0));
        Ok(response)
    }
}

fn build_response(req: &FetchRequest, document: &FetchedDocument, page: &Page) -> FetchResponse {
    let (next_index, has_more, no_more_content) = match page {
        Page::Window(window) => (window.next_index, window.has_more, false),
        Page::NoMoreContent { .. } => (None, false, true),
    };

    FetchResponse {
        url: req.url.clone(),
        final_url: Some(document.final_url.clone()),
        status_code: document.status_code,
        content_type: document.content_type.clone(),
        format: document.content.format(),
        notice: document.content.notice().map(|s| s.to_string()),
        content: page.render(),
        total_length: document.content.length(),
        start_index: req.start_index,
        next_index,
        has_more,
        no_more_content,
    }
}
