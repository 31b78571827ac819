// ABOUTME: Main library entry point for html-decoct, a content-extraction facade.
// ABOUTME: Re-exports the public API: Decoct, DecoctBuilder, the collaborator traits, and their defaults.

//! html-decoct - get simplified HTML, clean text, or image URLs from a URL or an HTML string.
//!
//! The [`Decoct`] facade decides whether a source is a URL or markup, fetches
//! it through a [`Requestor`] when needed, and routes the document to the
//! [`Extractor`] bound to the requested operation.
//!
//! # Example
//!
//! ```no_run
//! use html_decoct::{Decoct, DecoctError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DecoctError> {
//!     let decoct = Decoct::default();
//!     let text = decoct.get_clean_html("https://example.com/article").await?;
//!     println!("{}", text);
//!
//!     let images = decoct.get_images("<p><img src=\"https://example.com/a.jpg\"></p>").await?;
//!     println!("{:?}", images);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod formats;
pub mod options;
pub mod resource;
pub mod source;

pub use crate::client::Decoct;
pub use crate::error::{DecoctError, ErrorCode};
pub use crate::extractors::{
    CleanTextExtractor, Extractor, ImageUrlExtractor, SimplifiedHtml, SimplifiedHtmlExtractor,
};
pub use crate::options::{DecoctBuilder, HttpRequestorBuilder, Options};
pub use crate::resource::{HttpRequestor, Requestor};
pub use crate::source::{classify, SourceKind};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecoctError>;
