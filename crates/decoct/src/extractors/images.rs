// ABOUTME: Image URL extraction: every image a document references, in document order.
// ABOUTME: Resolves against <base href>, skips data URIs, and filters tracking pixels.

use std::collections::HashSet;

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::DecoctError;
use crate::extractors::Extractor;

/// Substrings marking tracking pixels or spacer images (matched case-insensitively).
const TRACKING_MARKERS: &[&str] = &[
    "pixel",
    "tracking",
    "analytics",
    "beacon",
    "spacer",
    "clear.gif",
    "blank.gif",
    "1x1",
];

static TRACKING_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(TRACKING_MARKERS)
        .unwrap()
});

static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img, meta[property='og:image'], meta[name='twitter:image']").unwrap()
});
static BASE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("base[href]").unwrap());

/// Lists the image URLs a document references.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageUrlExtractor;

#[async_trait]
impl Extractor for ImageUrlExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "ImageUrl"
    }

    async fn extract(&self, html: &str) -> Result<Vec<String>, DecoctError> {
        Ok(extract_image_urls(html))
    }
}

/// Collect image URLs from `<img src>`, lazy-load `data-src`, and social meta tags.
///
/// The result is deduplicated and may be empty.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let base = doc
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| Url::parse(href.trim()).ok());

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for element in doc.select(&IMAGE_SELECTOR) {
        for raw in candidate_sources(&element) {
            let Some(url) = resolve_image_url(raw, base.as_ref()) else {
                continue;
            };
            if is_valid_image_url(&url) && seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }
    urls
}

fn candidate_sources<'a>(element: &ElementRef<'a>) -> Vec<&'a str> {
    let value = element.value();
    if value.name() == "meta" {
        return value.attr("content").into_iter().collect();
    }
    ["src", "data-src"]
        .iter()
        .filter_map(|attr| value.attr(attr))
        .collect()
}

/// Resolve `src` against the document base.
///
/// Absolute URLs pass through; relative ones are joined with `base` or, with
/// no base, kept as written. Empty values and data URIs yield `None`.
pub fn resolve_image_url(src: &str, base: Option<&Url>) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return None;
    }

    if let Ok(absolute) = Url::parse(src) {
        return Some(absolute.to_string());
    }

    match base {
        Some(base) => base.join(src).ok().map(|u| u.to_string()),
        None => Some(src.to_string()),
    }
}

/// Checks that an image URL is not a tracking pixel or spacer.
pub fn is_valid_image_url(url: &str) -> bool {
    !TRACKING_MATCHER.is_match(url) && !contains_tiny_dimensions(&url.to_lowercase())
}

/// Query-string hints of a 1x1 image.
fn contains_tiny_dimensions(url: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    query
        .split('&')
        .any(|pair| matches!(pair, "width=1" | "height=1" | "w=1" | "h=1"))
}
