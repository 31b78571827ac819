// ABOUTME: Configuration for html-decoct: HTTP Options, the HttpRequestor builder, and the DecoctBuilder.
// ABOUTME: DecoctBuilder injects collaborators; swapping one changes the builder's type parameter.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Decoct;
use crate::extractors::{CleanTextExtractor, ImageUrlExtractor, SimplifiedHtmlExtractor};
use crate::resource::HttpRequestor;

/// Default User-Agent sent by the HTTP requestor.
pub const DEFAULT_USER_AGENT: &str = "html-decoct/0.1";

/// Settings for the default HTTP requestor.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub parse_non_200: bool,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allow_private_networks: false,
            parse_non_200: false,
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

/// Fluent builder for [`HttpRequestor`].
#[derive(Debug, Clone, Default)]
pub struct HttpRequestorBuilder {
    opts: Options,
}

impl HttpRequestorBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Hand non-200 response bodies to the extractor instead of failing.
    pub fn parse_non_200(mut self, parse: bool) -> Self {
        self.opts.parse_non_200 = parse;
        self
    }

    /// Add a header to every request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a caller-supplied HTTP client. Timeout, User-Agent, and redirect
    /// settings are then the caller's responsibility.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the requestor from the collected options.
    pub fn build(self) -> HttpRequestor {
        HttpRequestor::new(self.opts)
    }
}

/// Builder wiring a requestor and the three extractors into a [`Decoct`].
///
/// Every slot starts with the crate's default collaborator.
pub struct DecoctBuilder<
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

impl DecoctBuilder {
    /// Create a builder holding the default collaborators.
    pub fn new() -> Self {
        Self {
            requestor: HttpRequestor::default(),
            simplified: SimplifiedHtmlExtractor,
            clean: CleanTextExtractor,
            images: ImageUrlExtractor,
        }
    }
}

impl Default for DecoctBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C, I> DecoctBuilder<HttpRequestor, S, C, I> {
    /// Rebuild the default HTTP requestor with the given options.
    pub fn options(mut self, opts: Options) -> Self {
        self.requestor = HttpRequestor::new(opts);
        self
    }
}

impl<R, S, C, I> DecoctBuilder<R, S, C, I> {
    /// Replace the requestor.
    pub fn requestor<R2>(self, requestor: R2) -> DecoctBuilder<R2, S, C, I> {
        DecoctBuilder {
            requestor,
            simplified: self.simplified,
            clean: self.clean,
            images: self.images,
        }
    }

    /// Replace the extractor behind `get_simplified_html`.
    pub fn simplified_extractor<S2>(self, extractor: S2) -> DecoctBuilder<R, S2, C, I> {
        DecoctBuilder {
            requestor: self.requestor,
            simplified: extractor,
            clean: self.clean,
            images: self.images,
        }
    }

    /// Replace the extractor behind `get_clean_html`.
    pub fn clean_extractor<C2>(self, extractor: C2) -> DecoctBuilder<R, S, C2, I> {
        DecoctBuilder {
            requestor: self.requestor,
            simplified: self.simplified,
            clean: extractor,
            images: self.images,
        }
    }

    /// Replace the extractor behind `get_images`.
    pub fn image_extractor<I2>(self, extractor: I2) -> DecoctBuilder<R, S, C, I2> {
        DecoctBuilder {
            requestor: self.requestor,
            simplified: self.simplified,
            clean: self.clean,
            images: extractor,
        }
    }

    /// Build the facade. The collaborator bindings are fixed from here on.
    pub fn build(self) -> Decoct<R, S, C, I> {
        Decoct::new(self.requestor, self.simplified, self.clean, self.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.user_agent, DEFAULT_USER_AGENT);
        assert!(!opts.allow_private_networks);
        assert!(!opts.parse_non_200);
        assert!(opts.headers.is_empty());
        assert!(opts.http_client.is_none());
    }

    #[test]
    fn requestor_builder_collects_settings() {
        let requestor = HttpRequestorBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent("test-agent")
            .allow_private_networks(true)
            .parse_non_200(true)
            .header("X-Test", "1")
            .build();

        let opts = requestor.options();
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.user_agent, "test-agent");
        assert!(opts.allow_private_networks);
        assert!(opts.parse_non_200);
        assert_eq!(opts.headers.get("X-Test").map(String::as_str), Some("1"));
    }
}
