// ABOUTME: Simplified-HTML extraction: locate the main content block and sanitize it.
// ABOUTME: Falls back from the top scored candidate to <body> to the whole document.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::dom::scoring::{find_top_candidate, score_content};
use crate::error::DecoctError;
use crate::extractors::Extractor;
use crate::formats::{extract_title, sanitize_html};

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

/// A page reduced to its readable core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SimplifiedHtml {
    pub title: Option<String>,
    /// Sanitized HTML fragment of the main content.
    pub content: String,
}

/// Extracts the main content of a document as sanitized HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifiedHtmlExtractor;

#[async_trait]
impl Extractor for SimplifiedHtmlExtractor {
    type Output = SimplifiedHtml;

    fn name(&self) -> &'static str {
        "SimplifiedHtml"
    }

    async fn extract(&self, html: &str) -> Result<SimplifiedHtml, DecoctError> {
        simplify(html)
    }
}

/// Synchronous core of [`SimplifiedHtmlExtractor`].
pub fn simplify(html: &str) -> Result<SimplifiedHtml, DecoctError> {
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);

    let scores = score_content(&doc);
    let raw = match find_top_candidate(&doc, &scores) {
        Some(el) if el.value().name() == "body" => el.inner_html(),
        Some(el) => el.html(),
        None => doc.root_element().inner_html(),
    };

    let content = sanitize_html(&raw);
    if !has_substance(&content) {
        return Err(DecoctError::extract(
            "SimplifiedHtml",
            Some(anyhow::anyhow!("no readable content found")),
        ));
    }

    Ok(SimplifiedHtml { title, content })
}

/// True when a sanitized fragment holds visible text or an image.
fn has_substance(fragment: &str) -> bool {
    let parsed = Html::parse_fragment(fragment);
    parsed.root_element().text().any(|t| !t.trim().is_empty())
        || parsed.select(&IMG_SELECTOR).next().is_some()
}
