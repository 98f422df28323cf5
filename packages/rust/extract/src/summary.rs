//! Summary flattening.
//!
//! The destination summary field does not accept `<p>` tags, so paragraphs
//! are turned into blank-line separated text. Other inline markup stays.

use std::sync::LazyLock;

use regex::Regex;

/// Stands in for a paragraph boundary between the two passes.
const MARKER: &str = "@@@";

/// Replace `<p>` boundaries in summary markup with blank lines.
pub fn flatten_summary(inner_html: &str) -> String {
    static P_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*<p(\s[^>]*)?>\s*").expect("valid regex"));
    static P_CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*</p>\s*").expect("valid regex"));
    static MARKER_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?:@@@)+").expect("valid regex"));

    let marked = P_OPEN_RE.replace_all(inner_html, MARKER);
    let marked = P_CLOSE_RE.replace_all(&marked, MARKER);
    MARKER_RUN_RE
        .replace_all(&marked, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_joined_by_blank_lines() {
        let html = "\n  <p>One.</p>\n  <p class=\"x\">Two <b>bold</b>.</p>\n";
        assert_eq!(flatten_summary(html), "One.\n\nTwo <b>bold</b>.");
    }

    #[test]
    fn non_paragraph_tags_untouched() {
        let html = "<pre>keep</pre><p>x</p>";
        assert_eq!(flatten_summary(html), "<pre>keep</pre>\n\nx");
    }

    #[test]
    fn empty_input() {
        assert_eq!(flatten_summary("   "), "");
    }
}
