//! Utility functions and constants for HTML processing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "isindex", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that have meaning even when blank
pub const MEANINGFUL_WHEN_BLANK: &[&str] = &[
    "a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script",
    "audio", "video",
];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is meaningful when blank
pub fn is_meaningful_when_blank(tag: &str) -> bool {
    MEANINGFUL_WHEN_BLANK.contains(&tag.to_lowercase().as_str())
}

/// Repeat a string n times
pub fn repeat(s: &str, n: usize) -> String {
    s.repeat(n)
}

/// Patterns escaped in text nodes. Anchored patterns only apply at the start
/// of the text, where they would otherwise open a block construct.
static ESCAPES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\$1"),
        (r"^(#{1,6}) ", r"\$1 "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"$1\. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid escape pattern {pattern}: {e}"));
        (regex, replacement)
    })
    .collect()
});

/// Escape Markdown syntax in a text node so it renders literally
pub fn escape_markdown(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        })
}

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\n+\s*)+").expect("valid regex"));

/// Clean an attribute value for use in a Markdown title or alt text:
/// runs of newlines (and the whitespace after them) become one newline.
pub fn clean_attribute(value: Option<&str>) -> String {
    value
        .map(|v| NEWLINE_RUNS.replace_all(v, "\n").into_owned())
        .unwrap_or_default()
}

pub(crate) fn trim_leading_newlines(s: &str) -> &str {
    s.trim_start_matches('\n')
}

pub(crate) fn trim_trailing_newlines(s: &str) -> &str {
    s.trim_end_matches('\n')
}

/// Join two rendered fragments. The separator is the larger newline run found
/// at the seam, capped at one blank line.
pub fn join(output: &str, replacement: &str) -> String {
    let head = trim_trailing_newlines(output);
    let tail = trim_leading_newlines(replacement);
    let newlines = (output.len() - head.len())
        .max(replacement.len() - tail.len())
        .min(2);

    let mut joined = String::with_capacity(head.len() + newlines + tail.len());
    joined.push_str(head);
    joined.push_str(&"\n".repeat(newlines));
    joined.push_str(tail);
    joined
}

/// Whitespace at the edges of a string, split into the ASCII part (space,
/// tab, CR, LF) closest to the outside and the remaining Unicode whitespace.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct EdgeWhitespace<'a> {
    pub leading: &'a str,
    pub leading_ascii: &'a str,
    pub leading_non_ascii: &'a str,
    pub trailing: &'a str,
    pub trailing_non_ascii: &'a str,
    pub trailing_ascii: &'a str,
}

fn is_ascii_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub(crate) fn edge_whitespace(s: &str) -> EdgeWhitespace<'_> {
    let leading_len = s.len() - s.trim_start().len();
    let leading = &s[..leading_len];
    let ascii_len = leading.len() - leading.trim_start_matches(is_ascii_ws).len();

    let rest = &s[leading_len..];
    let trailing = &rest[rest.trim_end().len()..];
    let trailing_ascii_start = trailing.trim_end_matches(is_ascii_ws).len();

    EdgeWhitespace {
        leading,
        leading_ascii: &leading[..ascii_len],
        leading_non_ascii: &leading[ascii_len..],
        trailing,
        trailing_non_ascii: &trailing[..trailing_ascii_start],
        trailing_ascii: &trailing[trailing_ascii_start..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*test*"), "\\*test\\*");
        assert_eq!(escape_markdown("snake_case"), "snake\\_case");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("back\\slash"), "back\\\\slash");
        assert_eq!(escape_markdown("normal"), "normal");
    }

    #[test]
    fn test_escape_markdown_line_start_only() {
        assert_eq!(escape_markdown("- item"), "\\- item");
        assert_eq!(escape_markdown("a - b"), "a - b");
        assert_eq!(escape_markdown("## not a heading"), "\\## not a heading");
        assert_eq!(escape_markdown("1. first"), "1\\. first");
        assert_eq!(escape_markdown("> quote"), "\\> quote");
        assert_eq!(escape_markdown("=== x"), "\\=== x");
        assert_eq!(escape_markdown("+ plus"), "\\+ plus");
        assert_eq!(escape_markdown("~~~"), "\\~~~");
    }

    #[test]
    fn test_clean_attribute() {
        assert_eq!(clean_attribute(Some("a\n\n  b")), "a\nb");
        assert_eq!(clean_attribute(None), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "text"), "text");
        assert_eq!(join("a\n\n", "b"), "a\n\nb");
        assert_eq!(join("a", "\n\n\n\nb"), "a\n\nb");
        assert_eq!(join("a\n", "\nb"), "a\nb");
        assert_eq!(join("a  \n", "b"), "a  \nb");
    }

    #[test]
    fn test_edge_whitespace() {
        let edges = edge_whitespace(" \u{a0}text\u{a0}\n");
        assert_eq!(edges.leading, " \u{a0}");
        assert_eq!(edges.leading_ascii, " ");
        assert_eq!(edges.leading_non_ascii, "\u{a0}");
        assert_eq!(edges.trailing, "\u{a0}\n");
        assert_eq!(edges.trailing_non_ascii, "\u{a0}");
        assert_eq!(edges.trailing_ascii, "\n");

        let blank = edge_whitespace("   ");
        assert_eq!(blank.leading, "   ");
        assert_eq!(blank.trailing, "");
    }

    #[test]
    fn test_repeat() {
        assert_eq!(repeat("=", 5), "=====");
    }

    #[test]
    fn test_is_block() {
        assert!(is_block("div"));
        assert!(is_block("DIV"));
        assert!(!is_block("span"));
    }

    #[test]
    fn test_is_void() {
        assert!(is_void("br"));
        assert!(is_void("HR"));
        assert!(!is_void("div"));
    }
}
