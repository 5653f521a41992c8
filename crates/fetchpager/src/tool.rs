//! Tool builder and contract for FetchPager
//!
//! [`Tool`] is the entry point a host runtime holds on to. It owns the
//! per-origin rate limiters, so one `Tool` must be shared across calls:
//! a tool built per call would start every limiter fresh.

use crate::cache::ContentCache;
use crate::client::{FetchClient, FetchOptions};
use crate::error::FetchError;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::rate_limit::OriginLimiters;
use crate::types::{FetchRequest, FetchResponse};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default number of cached documents when the cache is enabled
pub const DEFAULT_CACHE_ENTRIES: usize = 64;

/// Status update during tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    /// Current phase ("validate", "rate_limit", "fetch", "convert", "paginate", "complete")
    pub phase: String,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Estimated completion percentage (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f32>,
}

impl ToolStatus {
    /// Create a new status with phase
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            message: None,
            percent_complete: None,
        }
    }

    /// Set message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set completion percentage
    pub fn with_percent(mut self, percent: f32) -> Self {
        self.percent_complete = Some(percent);
        self
    }
}

/// Text result handed back to the host runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    /// Render a successful response
    pub fn success(response: &FetchResponse) -> Self {
        Self {
            text: format!(
                "{}Contents of {}:\n{}",
                response.notice.as_deref().unwrap_or(""),
                response.url,
                response.content
            ),
            is_error: false,
        }
    }

    /// Render a pipeline error
    pub fn error(err: &FetchError) -> Self {
        Self {
            text: err.to_string(),
            is_error: true,
        }
    }
}

/// Builder for configuring the FetchPager tool
#[derive(Clone, Default)]
pub struct ToolBuilder {
    options: FetchOptions,
    min_interval: Duration,
    origin_intervals: Vec<(String, Duration)>,
    cache: Option<(Duration, usize)>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl ToolBuilder {
    /// Create a new tool builder with default transport options and no
    /// rate limiting
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = ua.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set how many redirects to follow; zero disables following
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.options.follow_redirects = max > 0;
        self.options.max_redirects = max;
        self
    }

    /// Set the body size cap in bytes
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.options.max_body_bytes = max;
        self
    }

    /// Minimum spacing between requests to any one origin
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Minimum spacing for one origin, overriding [`min_interval`](Self::min_interval)
    pub fn origin_interval(mut self, origin: impl Into<String>, interval: Duration) -> Self {
        self.origin_intervals.push((origin.into(), interval));
        self
    }

    /// Keep normalized documents for `ttl` so later windows skip the refetch
    pub fn cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache = Some((ttl, max_entries));
        self
    }

    /// Use a custom fetcher instead of the HTTP one
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the tool
    pub fn build(self) -> Result<Tool, FetchError> {
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.options)?),
        };

        let limiters = self
            .origin_intervals
            .iter()
            .fold(OriginLimiters::new(self.min_interval), |limiters, (origin, interval)| {
                limiters.with_origin(origin, *interval)
            });

        let mut client = FetchClient::new(fetcher, Arc::new(limiters));
        if let Some((ttl, max_entries)) = self.cache {
            client = client.with_cache(Arc::new(ContentCache::new(ttl, max_entries)));
        }

        Ok(Tool { client })
    }
}

/// Configured FetchPager tool
pub struct Tool {
    client: FetchClient,
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FetchRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get output schema as JSON
    pub fn output_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FetchResponse);
        serde_json::to_value(schema).unwrap_or_default()
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// Execute the tool with the given request
    pub async fn execute(&self, req: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.client.execute(&req).await
    }

    /// Execute the tool with status updates
    pub async fn execute_with_status<F>(
        &self,
        req: FetchRequest,
        status_callback: F,
    ) -> Result<FetchResponse, FetchError>
    where
        F: FnMut(ToolStatus),
    {
        self.client.execute_with_status(&req, status_callback).await
    }

    /// Execute and render the result as text
    ///
    /// Errors never escape: they come back as output with `is_error` set.
    pub async fn call(&self, req: FetchRequest) -> ToolOutput {
        match self.execute(req).await {
            Ok(response) => ToolOutput::success(&response),
            Err(e) => {
                warn!(error = %e, "Fetch failed");
                ToolOutput::error(&e)
            }
        }
    }

    /// Parse tool-call arguments, execute, and render the result as text
    pub async fn call_json(&self, arguments: serde_json::Value) -> ToolOutput {
        match FetchRequest::from_json(arguments) {
            Ok(req) => self.call(req).await,
            Err(e) => ToolOutput::error(&e),
        }
    }
}
