//! Text normalization of retrieved payloads

use crate::classify::Classification;
use crate::convert::html_to_markdown_with_base;
use crate::fetcher::RetrievedPayload;
use crate::types::ContentFormat;
use tracing::warn;

/// Text returned in place of content when HTML simplification yields nothing
///
/// Conversion failure is not a pipeline error: the caller receives this
/// marker as the page content.
pub const CONVERSION_FAILED: &str = "<error>Page failed to be simplified from HTML</error>";

/// Normalized text of one retrieved payload
///
/// Produced once per request. Pagination reads it but never changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    text: String,
    length: usize,
    format: ContentFormat,
    notice: Option<String>,
}

impl NormalizedContent {
    fn new(text: String, format: ContentFormat, notice: Option<String>) -> Self {
        let length = text.chars().count();
        Self {
            text,
            length,
            format,
            notice,
        }
    }

    /// The normalized text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn format(&self) -> ContentFormat {
        self.format
    }

    /// Notice to show ahead of content that could not be converted
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

/// Notice prefixed to non-HTML content returned without conversion
pub fn raw_content_notice(content_type: Option<&str>) -> String {
    format!(
        "Content type {} cannot be simplified to markdown, but here is the raw content:\n",
        content_type.unwrap_or("")
    )
}

/// Normalize a payload according to its classification
///
/// - `raw`: body unchanged
/// - not HTML: body unchanged, with a notice naming the content type
/// - HTML: simplified to markdown, or [`CONVERSION_FAILED`] if nothing is left
pub fn normalize(
    payload: &RetrievedPayload,
    classification: Classification,
    raw: bool,
) -> NormalizedContent {
    if raw {
        return NormalizedContent::new(payload.body.clone(), ContentFormat::Raw, None);
    }

    if !classification.is_html {
        return NormalizedContent::new(
            payload.body.clone(),
            ContentFormat::Raw,
            Some(raw_content_notice(payload.content_type.as_deref())),
        );
    }

    let markdown = html_to_markdown_with_base(&payload.body, Some(&payload.final_url));
    if markdown.is_empty() {
        warn!(url = %payload.final_url, "HTML simplification produced no text");
        return NormalizedContent::new(
            CONVERSION_FAILED.to_string(),
            ContentFormat::Markdown,
            None,
        );
    }

    NormalizedContent::new(markdown, ContentFormat::Markdown, None)
}
