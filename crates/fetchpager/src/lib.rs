//! FetchPager - rate-limited web content fetching with resumable pagination
//!
//! This crate fetches a URL, simplifies HTML to markdown, and returns the
//! result one bounded window at a time. Calls to the same origin are spaced
//! by a configurable minimum interval.
//!
//! ## Pipeline
//!
//! Each request runs:
//! validate → rate limit → retrieve → classify → normalize → paginate
//!
//! - [`RateLimiter`] / [`OriginLimiters`] - minimum spacing per origin
//! - [`Fetcher`] / [`HttpFetcher`] - network retrieval
//! - [`classify()`] - permissive HTML detection
//! - [`normalize()`] - HTML to markdown, or raw passthrough
//! - [`paginate()`] - character windows with continuation offsets
//!
//! [`Tool`] ties these together and turns every error into a text result.

pub mod cache;
pub mod classify;
pub mod client;
mod convert;
mod error;
pub mod fetcher;
pub mod normalize;
pub mod paginate;
pub mod rate_limit;
mod tool;
mod types;

pub use cache::ContentCache;
pub use classify::{classify, Classification};
pub use client::{FetchClient, FetchOptions, FetchedDocument};
pub use convert::{html_to_markdown, html_to_markdown_with_base};
pub use error::FetchError;
pub use fetcher::{Fetcher, HttpFetcher, RetrievedPayload};
pub use normalize::{normalize, NormalizedContent, CONVERSION_FAILED};
pub use paginate::{paginate, Page, PaginationWindow, NO_MORE_CONTENT};
pub use rate_limit::{OriginLimiters, RateLimiter};
pub use tool::{Tool, ToolBuilder, ToolOutput, ToolStatus, DEFAULT_CACHE_ENTRIES};
pub use types::{ContentFormat, FetchRequest, FetchResponse, DEFAULT_MAX_LENGTH, MAX_LENGTH_LIMIT};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str =
    "FetchPager/1.0 (Autonomous; +https://github.com/fetchpager/fetchpager)";

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Fetches a URL from the internet and extracts its contents as markdown.

- Converts HTML to simplified markdown
- Returns other content types unchanged, with a notice
- Long content is returned in windows; use start_index to continue
- Requests to the same site are rate limited"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# FetchPager Tool

Fetches a URL from the internet and extracts its contents as markdown.

## Capabilities
- HTTP/HTTPS GET with redirects followed
- HTML to Markdown conversion
- Raw passthrough for non-HTML content, or on request
- Paginated output for long documents
- Per-site rate limiting

## Input Parameters
- `url` (required): The URL to fetch (must be http:// or https://)
- `max_length` (optional): Maximum characters to return, 1 to 1000000 (default: 5000)
- `start_index` (optional): Character offset to start from (default: 0)
- `raw` (optional): Return the page without simplification (default: false)

## Output
Text starting with `Contents of <url>:` followed by the window of content.
Non-HTML content is preceded by a notice naming its content type.
When more content remains, the window ends with a notice giving the
`start_index` to use for the next call.

## Examples

### Fetch a webpage as markdown
```json
{"url": "https://example.com"}
```

### Continue a truncated page
```json
{"url": "https://example.com", "start_index": 5000}
```

### Fetch raw HTML
```json
{"url": "https://example.com", "raw": true}
```

## Error Handling
- Invalid URLs and out-of-range parameters return an error
- Network failures and non-2xx statuses return an error with the cause
- A start_index past the end returns "No more content available." (not an error)
"#;
