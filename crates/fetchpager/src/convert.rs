//! HTML to markdown conversion

use url::Url;

/// Elements whose content is dropped entirely
const SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "iframe", "svg", "template",
];

/// Longest entity name we try to decode, without the `&` and `;`
const MAX_ENTITY_LEN: usize = 10;

/// Convert HTML to markdown
pub fn html_to_markdown(html: &str) -> String {
    html_to_markdown_with_base(html, None)
}

/// Convert HTML to markdown, resolving relative links and image sources
/// against `base`
pub fn html_to_markdown_with_base(html: &str, base: Option<&Url>) -> String {
    let mut output = String::new();
    let mut links: Vec<Option<String>> = Vec::new();
    let mut list_depth: usize = 0;
    let mut row_cells: usize = 0;
    let mut in_pre = false;
    let mut in_blockquote = false;

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '<' {
            let text = if c == '&' {
                decode_entity(&mut chars)
            } else {
                c.to_string()
            };
            if in_blockquote && text == "\n" {
                output.push_str("\n> ");
            } else {
                output.push_str(&text);
            }
            continue;
        }

        // Parse tag
        let mut tag = String::new();
        while let Some(&next) = chars.peek() {
            if next == '>' {
                chars.next();
                break;
            }
            tag.push(next);
            chars.next();
        }

        if tag.starts_with("!--") {
            skip_comment(&tag, &mut chars);
            continue;
        }
        if tag.starts_with('!') || tag.starts_with('?') {
            // Doctype or processing instruction
            continue;
        }

        let tag_lower = tag.to_lowercase();
        let is_closing = tag_lower.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name_part = if is_closing {
            &tag_lower[1..]
        } else {
            &tag_lower[..]
        };
        let tag_name = name_part
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches('/');

        if SKIP_TAGS.contains(&tag_name) {
            // Stray closers are ignored
            if !is_closing && !self_closing {
                skip_raw_content(tag_name, &mut chars);
            }
            continue;
        }

        match tag_name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if is_closing {
                    output.push_str("\n\n");
                } else {
                    let level = tag_name[1..].parse::<usize>().unwrap_or(1);
                    output.push('\n');
                    output.push_str(&"#".repeat(level));
                    output.push(' ');
                }
            }
            "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "nav"
            | "aside" | "table" => {
                if is_closing {
                    output.push_str("\n\n");
                }
            }
            "br" => {
                output.push('\n');
            }
            "hr" => {
                output.push_str("\n---\n");
            }
            "ul" | "ol" => {
                if is_closing {
                    list_depth = list_depth.saturating_sub(1);
                    if list_depth == 0 {
                        output.push('\n');
                    }
                } else {
                    list_depth += 1;
                }
            }
            "li" => {
                if !is_closing {
                    output.push_str("\n- ");
                }
            }
            "tr" => {
                if is_closing {
                    output.push('\n');
                } else {
                    row_cells = 0;
                }
            }
            "td" | "th" => {
                if !is_closing {
                    if row_cells > 0 {
                        output.push_str(" | ");
                    }
                    row_cells += 1;
                }
            }
            "strong" | "b" => {
                output.push_str("**");
            }
            "em" | "i" => {
                output.push('*');
            }
            "pre" => {
                output.push_str("\n```\n");
                in_pre = !is_closing;
            }
            "code" => {
                if !in_pre {
                    output.push('`');
                }
            }
            "blockquote" => {
                if is_closing {
                    in_blockquote = false;
                    output.push('\n');
                } else {
                    in_blockquote = true;
                    output.push_str("\n> ");
                }
            }
            "a" => {
                if is_closing {
                    if let Some(Some(href)) = links.pop() {
                        output.push_str(&format!("]({})", href));
                    }
                } else if !self_closing {
                    let href = extract_attribute(&tag, "href").map(|h| resolve(&h, base));
                    if href.is_some() {
                        output.push('[');
                    }
                    links.push(href);
                }
            }
            "img" => {
                if let Some(src) = extract_attribute(&tag, "src") {
                    let alt = extract_attribute(&tag, "alt").unwrap_or_default();
                    output.push_str(&format!("![{}]({})", alt, resolve(&src, base)));
                }
            }
            _ => {}
        }
    }

    // Close links left open by truncated markup
    while let Some(link) = links.pop() {
        if let Some(href) = link {
            output.push_str(&format!("]({})", href));
        }
    }

    clean_whitespace(&output)
}

/// Consume the rest of an HTML comment whose body contained `>`
fn skip_comment(tag: &str, chars: &mut std::iter::Peekable<std::str::Chars>) {
    if tag.len() >= 5 && tag.ends_with("--") {
        return;
    }
    let mut dashes = 0;
    for c in chars.by_ref() {
        match c {
            '-' => dashes += 1,
            '>' if dashes >= 2 => return,
            _ => dashes = 0,
        }
    }
}

/// Consume everything up to and including the closing tag of `name`
///
/// The content is not parsed, so `<` inside scripts and styles cannot
/// start a tag.
fn skip_raw_content(name: &str, chars: &mut std::iter::Peekable<std::str::Chars>) {
    let closer: Vec<char> = format!("</{}", name).chars().collect();
    let mut matched = 0;

    while let Some(c) = chars.next() {
        if c.to_ascii_lowercase() != closer[matched] {
            matched = usize::from(c == '<');
            continue;
        }

        matched += 1;
        if matched < closer.len() {
            continue;
        }

        // `</scripts` is not `</script`
        match chars.peek() {
            Some(&next) if next == '>' || next == '/' || next.is_whitespace() => {
                for c in chars.by_ref() {
                    if c == '>' {
                        return;
                    }
                }
                return;
            }
            None => return,
            _ => matched = 0,
        }
    }
}

fn resolve(href: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

/// Extract attribute value from tag
fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=", attr);
    let tag_lower = tag.to_lowercase();

    let mut search_from = 0;
    while let Some(found) = tag_lower[search_from..].find(&pattern) {
        let start = search_from + found;
        search_from = start + pattern.len();

        // Must be a whole attribute name, not the tail of another one
        let preceded_by_space = tag_lower[..start]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(false);
        if !preceded_by_space {
            continue;
        }

        let rest = tag[start + pattern.len()..].trim_start();

        let value = if let Some(rest) = rest.strip_prefix('"') {
            rest.find('"').map(|end| &rest[..end])
        } else if let Some(rest) = rest.strip_prefix('\'') {
            rest.find('\'').map(|end| &rest[..end])
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            Some(rest[..end].trim_end_matches('/'))
        };
        return value.map(decode_entities);
    }
    None
}

/// Decode every entity in an attribute value
fn decode_entities(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            decoded.push_str(&decode_entity(&mut chars));
        } else {
            decoded.push(c);
        }
    }
    decoded
}

/// Decode an HTML entity following an ampersand
///
/// Unknown or unterminated entities are returned verbatim.
fn decode_entity(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut lookahead = chars.clone();
    let mut entity = String::new();
    let mut terminated = false;

    for next in lookahead.by_ref() {
        if next == ';' {
            terminated = true;
            break;
        }
        if next.is_whitespace() || next == '&' || next == '<' || entity.len() > MAX_ENTITY_LEN {
            break;
        }
        entity.push(next);
    }

    if !terminated {
        return "&".to_string();
    }

    let decoded = match entity.as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "hellip" => Some('…'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        _ => entity.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match decoded {
        Some(ch) => {
            // Consume the entity and its semicolon
            for _ in 0..=entity.chars().count() {
                chars.next();
            }
            ch.to_string()
        }
        None => "&".to_string(),
    }
}

/// Clean whitespace: collapse runs, trim, keep max 2 newlines
pub fn clean_whitespace(s: &str) -> String {
    let mut result = String::new();
    let mut last_was_space = false;
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            // Remove trailing space before newline
            if last_was_space && result.ends_with(' ') {
                result.pop();
            }
            newline_count += 1;
            last_was_space = true;
            if newline_count <= 2 {
                result.push(c);
            }
        } else if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            newline_count = 0;
            last_was_space = false;
            result.push(c);
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_markdown_headers() {
        let html = "<h1>Title</h1><h2>Subtitle</h2><h6>Deep</h6>";
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("## Subtitle"));
        assert!(md.contains("###### Deep"));
    }

    #[test]
    fn test_html_to_markdown_paragraphs() {
        let html = "<p>First paragraph</p><p>Second paragraph</p>";
        let md = html_to_markdown(html);
        assert_eq!(md, "First paragraph\n\nSecond paragraph");
    }

    #[test]
    fn test_html_to_markdown_lists() {
        let html = "<ul><li>Item 1</li><li>Item 2<ul><li>Nested</li></ul></li></ul>";
        let md = html_to_markdown(html);
        assert!(md.contains("- Item 1"));
        assert!(md.contains("- Item 2"));
        assert!(md.contains("- Nested"));
        assert!(!md.contains("<li>"));
    }

    #[test]
    fn test_html_to_markdown_emphasis() {
        let html = "<p><strong>bold</strong> and <em>italic</em></p>";
        let md = html_to_markdown(html);
        assert!(md.contains("**bold**"));
        assert!(md.contains("*italic*"));
    }

    #[test]
    fn test_html_to_markdown_code() {
        let html = "<pre><code>code block</code></pre><p>use <code>x</code></p>";
        let md = html_to_markdown(html);
        assert!(md.contains("```\ncode block\n```"));
        assert!(md.contains("`x`"));
    }

    #[test]
    fn test_html_to_markdown_links() {
        let html = r#"<p>See <a href="https://example.com/docs">the docs</a> now</p>"#;
        let md = html_to_markdown(html);
        assert_eq!(md, "See [the docs](https://example.com/docs) now");
    }

    #[test]
    fn test_html_to_markdown_anchor_without_href() {
        let html = r#"<a name="top">Top</a>"#;
        assert_eq!(html_to_markdown(html), "Top");
    }

    #[test]
    fn test_html_to_markdown_resolves_relative_links() {
        let base = Url::parse("https://example.com/guide/intro.html").unwrap();
        let html = r#"<a href="../api/index.html">API</a> <img src="/logo.png" alt="Logo">"#;
        let md = html_to_markdown_with_base(html, Some(&base));
        assert!(md.contains("[API](https://example.com/api/index.html)"));
        assert!(md.contains("![Logo](https://example.com/logo.png)"));
    }

    #[test]
    fn test_html_to_markdown_skip_script_and_head() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><p>Before</p><script>alert('bad');</script><p>After</p></body></html>";
        let md = html_to_markdown(html);
        assert_eq!(md, "Before\n\nAfter");
    }

    #[test]
    fn test_html_to_markdown_script_with_comparison() {
        let html = "<html><body><script>for(var i=0;i<n;i++){x()}</script>\
                    <h1>Title</h1><p>Visible text</p></body></html>";
        assert_eq!(html_to_markdown(html), "# Title\n\nVisible text");
    }

    #[test]
    fn test_html_to_markdown_script_with_tag_strings() {
        let html = "<p>One</p><SCRIPT type=\"text/javascript\">\
                    document.write('<script src=\"a.js\"></scr' + 'ipt>'); var s = '</scripts>';\
                    </SCRIPT ><p>Two</p><style>a<b{}</style><p>Three</p>";
        assert_eq!(html_to_markdown(html), "One\n\nTwo\n\nThree");
    }

    #[test]
    fn test_html_to_markdown_skips_comments() {
        let html = "<p>Keep</p><!-- a > b --><p>This</p>";
        let md = html_to_markdown(html);
        assert_eq!(md, "Keep\n\nThis");
    }

    #[test]
    fn test_html_to_markdown_table_rows() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr><tr><td>Ann</td><td>31</td></tr></table>";
        let md = html_to_markdown(html);
        assert!(md.contains("Name | Age"));
        assert!(md.contains("Ann | 31"));
    }

    #[test]
    fn test_html_to_markdown_blockquote() {
        let html = "<blockquote>Quoted</blockquote>";
        assert_eq!(html_to_markdown(html), "> Quoted");
    }

    #[test]
    fn test_html_to_markdown_self_closing_br() {
        let html = "<p>one<br/>two<br />three</p>";
        assert_eq!(html_to_markdown(html), "one\ntwo\nthree");
    }

    #[test]
    fn test_entity_decoding() {
        let html = "<p>&amp; &lt; &gt; &quot; &apos; &mdash; &ndash; &copy; &reg; &#65; &#x42;</p>";
        let md = html_to_markdown(html);
        assert_eq!(md, "& < > \" ' — – © ® A B");
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<p><a href="/search?a=1&amp;b=2">Go</a> <img src="/i?w=1&amp;h=2" alt="A &amp; B"></p>"#;
        let md = html_to_markdown_with_base(html, Some(&base));
        assert_eq!(
            md,
            "[Go](https://example.com/search?a=1&b=2) ![A & B](https://example.com/i?w=1&h=2)"
        );
    }

    #[test]
    fn test_bare_ampersand_kept() {
        let html = "<p>AT&T and R&D &unknown; here</p>";
        assert_eq!(html_to_markdown(html), "AT&T and R&D &unknown; here");
    }

    #[test]
    fn test_only_markup_yields_empty() {
        assert_eq!(html_to_markdown("<html><head></head><body></body></html>"), "");
        assert_eq!(html_to_markdown("<script>var x = 1;</script>"), "");
    }

    #[test]
    fn test_clean_whitespace() {
        let input = "  hello   world  \n\n\n\n  test  ";
        let output = clean_whitespace(input);
        assert_eq!(output, "hello world\n\ntest");
    }

    #[test]
    fn test_extract_attribute() {
        assert_eq!(
            extract_attribute("a href=\"https://example.com\" class=\"link\"", "href"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            extract_attribute("img src='image.png'", "src"),
            Some("image.png".to_string())
        );
        assert_eq!(
            extract_attribute("div class=test", "class"),
            Some("test".to_string())
        );
        assert_eq!(
            extract_attribute("img data-src=\"lazy.png\"", "src"),
            None
        );
    }
}
