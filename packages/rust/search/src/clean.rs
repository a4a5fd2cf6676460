//! Cleanup passes for search-result text.
//!
//! The news API returns titles and descriptions with `<b>` highlight tags
//! and HTML entities; each pass is a function `&str -> String` applied in
//! sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Strip HTML tags and decode entities from a result field.
pub fn clean_text(raw: &str) -> String {
    let stripped = strip_tags(raw);
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all HTML tags.
fn strip_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("valid regex"));
    TAG_RE.replace_all(text, "").to_string()
}

/// Decode the small set of entities the news API actually emits.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
