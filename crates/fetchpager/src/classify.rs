//! Payload classification
//!
//! The heuristic favors HTML conversion when in doubt. A payload is HTML if any of these hold:
//! - the first 100 characters of the body, lower-cased, contain `<html`
//! - the declared content type contains `text/html`
//! - no content type was declared at all
//!
//! This is not MIME sniffing. Ambiguous payloads must keep classifying the
//! same way.

use crate::fetcher::RetrievedPayload;

/// Number of leading body characters inspected for an `<html` tag
const SNIFF_CHARS: usize = 100;

/// Result of classifying a payload, computed once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_html: bool,
}

/// Classify a retrieved payload
pub fn classify(payload: &RetrievedPayload) -> Classification {
    Classification {
        is_html: is_html(payload.content_type.as_deref(), &payload.body),
    }
}

/// Check if content is HTML based on content type and body prefix
pub fn is_html(content_type: Option<&str>, body: &str) -> bool {
    let prefix: String = body.chars().take(SNIFF_CHARS).collect();
    if prefix.to_lowercase().contains("<html") {
        return true;
    }

    match content_type {
        Some(ct) if !ct.is_empty() => ct.contains("text/html"),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html_by_content_type() {
        assert!(is_html(Some("text/html"), ""));
        assert!(is_html(Some("text/html; charset=utf-8"), ""));
        assert!(!is_html(Some("text/plain"), ""));
        assert!(!is_html(Some("application/json"), "{\"a\": 1}"));
        // Only the literal text/html substring counts
        assert!(!is_html(Some("application/xhtml+xml"), "<?xml version=\"1.0\"?>"));
    }

    #[test]
    fn test_is_html_by_body_prefix() {
        assert!(is_html(Some("text/plain"), "<!DOCTYPE html><html><body>"));
        assert!(is_html(Some("text/plain"), "<HTML><BODY>"));
        assert!(is_html(Some("application/octet-stream"), "   <html lang=\"en\">"));
    }

    #[test]
    fn test_is_html_tag_past_prefix_ignored() {
        let body = format!("{}<html>", "x".repeat(100));
        assert!(!is_html(Some("text/plain"), &body));

        let body = format!("{}<html>", "x".repeat(95));
        assert!(is_html(Some("text/plain"), &body));
    }

    #[test]
    fn test_is_html_without_content_type() {
        assert!(is_html(None, "Hello world"));
        assert!(is_html(None, "{\"json\": true}"));
        assert!(is_html(Some(""), "plain"));
    }

    #[test]
    fn test_classify_payload() {
        let payload = RetrievedPayload {
            body: "just text".to_string(),
            content_type: Some("text/plain".to_string()),
            status_code: 200,
            final_url: url::Url::parse("https://example.com/a.txt").unwrap(),
        };
        assert_eq!(classify(&payload), Classification { is_html: false });
    }
}
