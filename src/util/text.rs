use std::borrow::Cow;

use scraper::Html;

/// Ellipsis appended to truncated text
const ELLIPSIS: &str = "...";

/// Extracts the visible text from an HTML fragment.
///
/// Feed descriptions frequently embed markup (images, links, paragraphs).
/// Tags are dropped, entities are decoded by the HTML parser, and runs of
/// whitespace are collapsed to a single space.
///
/// # Examples
///
/// ```
/// use newsbot::util::clean_html;
///
/// assert_eq!(clean_html("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(clean_html("Fish &amp; chips"), "Fish & chips");
/// ```
pub fn clean_html(html: &str) -> String {
    // Fast path: plain text only needs whitespace normalization
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html).into_owned();
    }

    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text).into_owned()
}

/// Collapses every run of whitespace into one ASCII space and trims the ends.
///
/// Returns `Cow::Borrowed` when the input is already normalized.
pub fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    let mut prev_space = false;
    let normalized = trimmed.chars().all(|c| {
        let ok = if c.is_whitespace() {
            c == ' ' && !prev_space
        } else {
            true
        };
        prev_space = c.is_whitespace();
        ok
    });

    if normalized {
        return Cow::Borrowed(trimmed);
    }

    Cow::Owned(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Truncates a string to at most `max_chars` characters, appending "..."
/// when anything was cut.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text (Cyrillic,
/// CJK) is never split mid-character. The ellipsis is not counted against
/// `max_chars`.
///
/// # Examples
///
/// ```
/// use newsbot::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 5), "Hello...");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", s[..cut].trim_end(), ELLIPSIS)),
    }
}

/// Returns true if `needle` occurs in `haystack` delimited by
/// non-alphanumeric characters (or the string edges) on both sides.
///
/// Both arguments are expected to be lower-cased already. Multi-word needles
/// such as "machine learning" work as long as the spacing matches.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }

        // Advance past the first character of this match
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
