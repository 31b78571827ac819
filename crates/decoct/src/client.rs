// ABOUTME: The Decoct facade: classify a source, fetch it if it is a URL, run the bound extractor.
// ABOUTME: Offers async get_* operations and spawned callback variants for each artifact.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::DecoctError;
use crate::extractors::{
    CleanTextExtractor, Extractor, ImageUrlExtractor, SimplifiedHtmlExtractor,
};
use crate::options::DecoctBuilder;
use crate::resource::{HttpRequestor, Requestor};
use crate::source::{classify, SourceKind};

/// Content-extraction facade.
///
/// Holds one requestor and one extractor per public operation. The bindings
/// are fixed at construction and the facade keeps no per-call state, so a
/// single instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct Decoct<
    R = HttpRequestor,
    S = SimplifiedHtmlExtractor,
    C = CleanTextExtractor,
    I = ImageUrlExtractor,
> {
    requestor: R,
    simplified: S,
    clean: C,
    images: I,
}

impl Decoct {
    /// Create a builder starting from the default collaborators.
    pub fn builder() -> DecoctBuilder {
        DecoctBuilder::new()
    }
}

impl Default for Decoct {
    fn default() -> Self {
        DecoctBuilder::new().build()
    }
}

impl<R, S, C, I> Decoct<R, S, C, I> {
    /// Create a facade from explicit collaborators.
    pub fn new(requestor: R, simplified: S, clean: C, images: I) -> Self {
        Self {
            requestor,
            simplified,
            clean,
            images,
        }
    }
}

impl<R, S, C, I> Decoct<R, S, C, I>
where
    R: Requestor,
    S: Extractor,
    C: Extractor,
    I: Extractor,
{
    /// Simplified HTML of `source`, which may be a URL or an HTML document.
    pub async fn get_simplified_html(&self, source: &str) -> Result<S::Output, DecoctError> {
        self.run("get_simplified_html", source, &self.simplified).await
    }

    /// Clean text of `source`, which may be a URL or an HTML document.
    pub async fn get_clean_html(&self, source: &str) -> Result<C::Output, DecoctError> {
        self.run("get_clean_html", source, &self.clean).await
    }

    /// Image URLs referenced by `source`, which may be a URL or an HTML document.
    pub async fn get_images(&self, source: &str) -> Result<I::Output, DecoctError> {
        self.run("get_images", source, &self.images).await
    }

    /// Obtain the working document and hand it to `extractor`.
    ///
    /// The requestor runs only for URL sources, and a failed request ends the
    /// call before the extractor is touched. Errors pass through unchanged.
    async fn run<E: Extractor>(
        &self,
        op: &'static str,
        source: &str,
        extractor: &E,
    ) -> Result<E::Output, DecoctError> {
        let kind = classify(source);
        tracing::debug!(op, %kind, extractor = extractor.name(), "source classified");

        let fetched;
        let document = match kind {
            SourceKind::Html => source,
            SourceKind::Url => {
                fetched = self.requestor.request(source).await.map_err(|err| {
                    tracing::warn!(op, url = source, error = %err, "request failed");
                    err
                })?;
                fetched.as_str()
            }
        };

        let output = extractor.extract(document).await.map_err(|err| {
            tracing::warn!(op, extractor = extractor.name(), error = %err, "extraction failed");
            err
        })?;
        tracing::debug!(op, extractor = extractor.name(), "extraction finished");
        Ok(output)
    }
}

impl<R, S, C, I> Decoct<R, S, C, I>
where
    R: Requestor + 'static,
    S: Extractor + 'static,
    C: Extractor + 'static,
    I: Extractor + 'static,
    S::Output: 'static,
    C::Output: 'static,
    I::Output: 'static,
{
    /// Spawn [`get_simplified_html`](Self::get_simplified_html) and deliver the result to `callback`.
    ///
    /// Returns immediately; `callback` runs exactly once on the tokio runtime.
    /// Must be called from within a runtime.
    pub fn get_simplified_html_with_callback<F>(
        self: &Arc<Self>,
        source: impl Into<String>,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<S::Output, DecoctError>) + Send + 'static,
    {
        let this = Arc::clone(self);
        let source = source.into();
        tokio::spawn(async move { callback(this.get_simplified_html(&source).await) })
    }

    /// Spawn [`get_clean_html`](Self::get_clean_html) and deliver the result to `callback`.
    pub fn get_clean_html_with_callback<F>(
        self: &Arc<Self>,
        source: impl Into<String>,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<C::Output, DecoctError>) + Send + 'static,
    {
        let this = Arc::clone(self);
        let source = source.into();
        tokio::spawn(async move { callback(this.get_clean_html(&source).await) })
    }

    /// Spawn [`get_images`](Self::get_images) and deliver the result to `callback`.
    pub fn get_images_with_callback<F>(
        self: &Arc<Self>,
        source: impl Into<String>,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<I::Output, DecoctError>) + Send + 'static,
    {
        let this = Arc::clone(self);
        let source = source.into();
        tokio::spawn(async move { callback(this.get_images(&source).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct StubRequestor {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Requestor for StubRequestor {
        async fn request(&self, url: &str) -> Result<String, DecoctError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DecoctError::fetch(url, "Request", Some(anyhow::anyhow!("some error"))))
            } else {
                Ok("<html>some HTML</html>".to_string())
            }
        }
    }

    #[derive(Default)]
    struct RecordingExtractor {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Extractor for RecordingExtractor {
        type Output = usize;

        async fn extract(&self, html: &str) -> Result<usize, DecoctError> {
            self.seen.lock().unwrap().push(html.to_string());
            Ok(html.len())
        }
    }

    type TestDecoct = Decoct<
        StubRequestor,
        RecordingExtractor,
        RecordingExtractor,
        RecordingExtractor,
    >;

    fn decoct(fail: bool) -> TestDecoct {
        Decoct::new(
            StubRequestor {
                fail,
                ..Default::default()
            },
            RecordingExtractor::default(),
            RecordingExtractor::default(),
            RecordingExtractor::default(),
        )
    }

    #[tokio::test]
    async fn url_source_is_fetched_then_extracted() {
        let d = decoct(false);
        let len = d.get_simplified_html("some URL").await.expect("ok");

        assert_eq!(len, "<html>some HTML</html>".len());
        assert_eq!(d.requestor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *d.simplified.seen.lock().unwrap(),
            vec!["<html>some HTML</html>".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_request_skips_extraction() {
        let d = decoct(true);
        let err = d.get_clean_html("some URL").await.expect_err("fetch fails");

        assert!(err.is_fetch());
        assert_eq!(err.source.as_ref().map(|e| e.to_string()), Some("some error".to_string()));
        assert_eq!(d.requestor.calls.load(Ordering::SeqCst), 1);
        assert!(d.clean.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn html_source_skips_request() {
        let d = decoct(true);
        d.get_images("<html>some HTML</html>").await.expect("ok");

        assert_eq!(d.requestor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(d.images.seen.lock().unwrap().len(), 1);
        assert!(d.simplified.seen.lock().unwrap().is_empty());
        assert!(d.clean.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn callback_runs_once_with_result() {
        let d = Arc::new(decoct(false));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = d.get_clean_html_with_callback("<p>x</p>", move |result| {
            tx.send(result).ok();
        });

        let result = rx.await.expect("callback should fire");
        assert_eq!(result.expect("ok"), "<p>x</p>".len());
        handle.await.expect("task should finish");
    }
}
