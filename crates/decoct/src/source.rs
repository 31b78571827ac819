// ABOUTME: Classifies a caller-supplied source string as either a URL or an inline HTML document.
// ABOUTME: The predicate is purely syntactic: any tag-like `<` token means HTML.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// `<` directly followed by a letter (`<div`), a slash (`</p>`), or a bang (`<!DOCTYPE`, `<!--`).
static TAG_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z/!]").unwrap());

/// What a source string turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    Html,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Url => "url",
            SourceKind::Html => "html",
        };
        write!(f, "{}", s)
    }
}

/// Classify a source string.
///
/// Total: every input is either `Html` (it contains a tag-like token) or `Url`.
/// A URL whose query carries a literal `<tag` will therefore be treated as
/// HTML; percent-encoded brackets (`%3C`) are not markup and stay URLs.
pub fn classify(source: &str) -> SourceKind {
    if TAG_TOKEN_RE.is_match(source) {
        SourceKind::Html
    } else {
        SourceKind::Url
    }
}
