// ABOUTME: The Extractor contract and the three default extraction strategies.
// ABOUTME: Each extractor turns HTML text into one artifact: simplified HTML, clean text, or image URLs.

//! Content extraction module.
//!
//! Submodules:
//! - `simplified`: main-content HTML picked by readability scoring, then sanitized.
//! - `text`: the whole document rendered as clean plain text.
//! - `images`: image URLs referenced by the document.

pub mod images;
pub mod simplified;
pub mod text;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DecoctError;

pub use images::ImageUrlExtractor;
pub use simplified::{SimplifiedHtml, SimplifiedHtmlExtractor};
pub use text::CleanTextExtractor;

/// Turns an HTML document into a derived artifact.
///
/// Implementations must complete exactly once. The facade never inspects
/// `Output`; it is handed to the caller as produced.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Output: Send;

    /// Short label used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn extract(&self, html: &str) -> Result<Self::Output, DecoctError>;
}

#[async_trait]
impl<T: Extractor + ?Sized> Extractor for Arc<T> {
    type Output = T::Output;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn extract(&self, html: &str) -> Result<Self::Output, DecoctError> {
        (**self).extract(html).await
    }
}
