use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+(?:,\s*\d+)*\]").expect("valid citation regex"));

/// Removes footnote-style citation markers like `[1]` or `[1, 2]`.
pub fn strip_citations(text: &str) -> Cow<'_, str> {
    CITATION.replace_all(text, "")
}
