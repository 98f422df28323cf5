//! Allow-list sanitizing of template markup.
//!
//! Mirrors the archive's accepted HTML subset: disallowed elements are
//! unwrapped (their text survives), a few are dropped along with their
//! content, comments vanish, and only a short list of attributes is kept.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

/// Elements kept in sanitized output.
pub const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "audio", "b", "big", "blockquote", "br", "caption",
    "center", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl", "dt",
    "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img", "ins", "kbd", "li",
    "ol", "p", "pre", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "summary",
    "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "tt", "u", "ul", "var",
];

/// Attributes kept on any allowed element.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "rel", "alt", "crossorigin", "preload", "href", "src", "height", "width", "controls",
];

/// URL schemes accepted in `href` and `src`.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto", "tel"];

/// Disallowed elements whose content is dropped too.
const DROP_WITH_CONTENT: &[&str] = &["script", "style", "textarea", "option", "noscript"];

const VOID_TAGS: &[&str] = &["br", "col", "hr", "img"];

const MAX_PASSES: usize = 4;

/// Reduce markup to the allowed subset.
pub fn sanitize(markup: &str) -> String {
    let mut current = sanitize_once(markup);
    // Unwrapping an element can leave markup the parser restructures; repeat until stable.
    for _ in 1..MAX_PASSES {
        let next = sanitize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Whether sanitizing would leave the markup structurally unchanged.
pub fn is_valid(markup: &str) -> bool {
    let trimmed = markup.trim();
    canonical(trimmed) == canonical(&sanitize(trimmed))
}

/// Whether text contains anything tag-shaped.
pub fn looks_like_markup(text: &str) -> bool {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)</?[a-z][\s\S]*>").expect("valid regex"));
    TAG_RE.is_match(text)
}

fn canonical(markup: &str) -> String {
    Html::parse_fragment(markup).root_element().inner_html()
}

fn sanitize_once(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    write_children(fragment.root_element(), false, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn write_children(parent: ElementRef<'_>, raw_text: bool, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => escape_text(text, out),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, out);
                }
            }
            // comments, doctypes, processing instructions
            _ => {}
        }
    }
}

fn write_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();

    if DROP_WITH_CONTENT.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        write_children(el, false, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        if allowed_attribute(attr, value) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }
    // the parser swallows one newline right after `<pre>`
    if name == "pre" && starts_with_newline(el) {
        out.push('\n');
    }

    // iframe content is raw text to the parser
    write_children(el, name == "iframe", out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn starts_with_newline(el: ElementRef<'_>) -> bool {
    matches!(
        el.first_child().map(|n| n.value()),
        Some(Node::Text(text)) if text.starts_with('\n')
    )
}

fn allowed_attribute(attr: &str, value: &str) -> bool {
    if !ALLOWED_ATTRIBUTES.contains(&attr) {
        return false;
    }
    match attr {
        "href" | "src" => has_allowed_scheme(value),
        _ => true,
    }
}

/// Relative URLs have no scheme and are always accepted.
fn has_allowed_scheme(url: &str) -> bool {
    let url = url.trim();
    match url.find([':', '/', '?', '#']) {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
