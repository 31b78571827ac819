// ABOUTME: Clean-text extraction: the visible text of a document, one line per block.
// ABOUTME: Drops head, script, and style content before rendering.

use async_trait::async_trait;

use crate::error::DecoctError;
use crate::extractors::Extractor;
use crate::formats::html_to_text;

/// Renders a document as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanTextExtractor;

#[async_trait]
impl Extractor for CleanTextExtractor {
    type Output = String;

    fn name(&self) -> &'static str {
        "CleanText"
    }

    async fn extract(&self, html: &str) -> Result<String, DecoctError> {
        let text = html_to_text(html);
        if text.is_empty() {
            return Err(DecoctError::extract(
                "CleanText",
                Some(anyhow::anyhow!("document has no visible text")),
            ));
        }
        Ok(text)
    }
}
