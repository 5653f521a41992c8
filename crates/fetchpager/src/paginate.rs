//! Stateless windowing over normalized text
//!
//! Offsets and lengths count characters, so a window never splits a code
//! point. No cursor is kept between calls: the caller passes `start_index`
//! back in to resume.

/// Content shown when `start_index` is at or past the end of the text
pub const NO_MORE_CONTENT: &str = "<error>No more content available.</error>";

/// One bounded slice of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationWindow {
    pub slice: String,
    pub start_index: usize,
    /// Offset to resume from; set only when more content remains
    pub next_index: Option<usize>,
    pub has_more: bool,
    pub total_length: usize,
}

/// Outcome of slicing text at an offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Window(PaginationWindow),
    /// Terminal case, distinct from an empty window
    NoMoreContent { total_length: usize },
}

impl Page {
    /// Text for the caller, with a continuation notice when more remains
    pub fn render(&self) -> String {
        match self {
            Page::NoMoreContent { .. } => NO_MORE_CONTENT.to_string(),
            Page::Window(window) => match window.next_index {
                Some(next_index) => format!(
                    "{}\n\n{}",
                    window.slice,
                    continuation_notice(next_index)
                ),
                None => window.slice.clone(),
            },
        }
    }
}

/// Notice telling the caller how to fetch the next window
pub fn continuation_notice(next_index: usize) -> String {
    format!(
        "<error>Content truncated. Call the fetch tool with a start_index of {} to get more content.</error>",
        next_index
    )
}

/// Slice `text` starting at character `start_index`, at most `max_length`
/// characters long
///
/// `total_length` is the character count of `text`, computed once by the
/// caller.
pub fn paginate(text: &str, total_length: usize, start_index: usize, max_length: usize) -> Page {
    if start_index >= total_length {
        return Page::NoMoreContent { total_length };
    }

    let mut indices = text.char_indices().map(|(i, _)| i).skip(start_index);
    let start_byte = match indices.next() {
        Some(byte) => byte,
        None => return Page::NoMoreContent { total_length },
    };
    let end_byte = text[start_byte..]
        .char_indices()
        .nth(max_length)
        .map(|(i, _)| start_byte + i)
        .unwrap_or(text.len());

    let slice = &text[start_byte..end_byte];
    if slice.is_empty() {
        return Page::NoMoreContent { total_length };
    }

    let slice_len = slice.chars().count();
    let end_index = start_index + slice_len;
    let has_more = end_index < total_length;

    Page::Window(PaginationWindow {
        slice: slice.to_string(),
        start_index,
        next_index: has_more.then_some(end_index),
        has_more,
        total_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "abcdefghijklmnopqrstuvwxy"; // 25 chars

    fn window(page: Page) -> PaginationWindow {
        match page {
            Page::Window(w) => w,
            Page::NoMoreContent { .. } => panic!("expected a window"),
        }
    }

    #[test]
    fn test_first_window_has_continuation() {
        let page = paginate(TEXT, 25, 0, 10);
        let rendered = page.render();
        let w = window(page);

        assert_eq!(w.slice, "abcdefghij");
        assert_eq!(w.next_index, Some(10));
        assert!(w.has_more);
        assert!(rendered.starts_with("abcdefghij\n\n"));
        assert!(rendered.contains("start_index of 10"));
    }

    #[test]
    fn test_last_window_has_no_continuation() {
        let page = paginate(TEXT, 25, 20, 10);
        assert_eq!(page.render(), "uvwxy");
        let w = window(page);
        assert_eq!(w.slice, "uvwxy");
        assert_eq!(w.next_index, None);
        assert!(!w.has_more);
    }

    #[test]
    fn test_window_ending_exactly_at_end() {
        let w = window(paginate(TEXT, 25, 15, 10));
        assert_eq!(w.slice.chars().count(), 10);
        assert!(!w.has_more);
        assert_eq!(w.next_index, None);
    }

    #[test]
    fn test_start_past_end_is_no_more_content() {
        let page = paginate(TEXT, 25, 30, 10);
        assert_eq!(page, Page::NoMoreContent { total_length: 25 });
        assert_eq!(page.render(), NO_MORE_CONTENT);
    }

    #[test]
    fn test_start_at_end_is_no_more_content() {
        assert_eq!(
            paginate(TEXT, 25, 25, 10),
            Page::NoMoreContent { total_length: 25 }
        );
        assert_eq!(paginate("", 0, 0, 10), Page::NoMoreContent { total_length: 0 });
    }

    #[test]
    fn test_windows_respect_max_length() {
        for start in 0..25 {
            for max in 1..30 {
                let w = window(paginate(TEXT, 25, start, max));
                let len = w.slice.chars().count();
                assert!(len <= max);
                assert_eq!(w.has_more, start + max < 25);
                if w.has_more {
                    assert_eq!(len, max);
                    assert_eq!(w.next_index, Some(start + max));
                }
            }
        }
    }

    #[test]
    fn test_multibyte_text_sliced_by_chars() {
        let text = "héllo wörld ✓ done";
        let total = text.chars().count();
        let w = window(paginate(text, total, 1, 4));
        assert_eq!(w.slice, "éllo");
        assert_eq!(w.next_index, Some(5));

        let w = window(paginate(text, total, 12, 3));
        assert_eq!(w.slice, "✓ d");
    }

    #[test]
    fn test_windows_reassemble_text() {
        let mut start = 0;
        let mut out = String::new();
        loop {
            match paginate(TEXT, 25, start, 7) {
                Page::Window(w) => {
                    out.push_str(&w.slice);
                    match w.next_index {
                        Some(next) => start = next,
                        None => break,
                    }
                }
                Page::NoMoreContent { .. } => break,
            }
        }
        assert_eq!(out, TEXT);
    }
}
