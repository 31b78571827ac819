// ABOUTME: The Requestor contract and its default HTTP implementation.
// ABOUTME: HttpRequestor fetches with SSRF protection, content-length limits, and charset decoding.

use std::net::{IpAddr, ToSocketAddrs};

use async_trait::async_trait;
use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use once_cell::sync::Lazy;
use url::Url;

use crate::error::DecoctError;
use crate::options::{HttpRequestorBuilder, Options};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const OP: &str = "Request";

static PRIVATE_V4: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    [
        "0.0.0.0/8",
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "127.0.0.0/8",
        "169.254.0.0/16",
    ]
    .iter()
    .map(|net| net.parse().unwrap())
    .collect()
});

static PRIVATE_V6: Lazy<Vec<Ipv6Net>> = Lazy::new(|| {
    ["fc00::/7", "fe80::/10"]
        .iter()
        .map(|net| net.parse().unwrap())
        .collect()
});

/// Fetches the HTML behind a URL.
///
/// Implementations must complete exactly once, with either the document text
/// or an error describing why it could not be obtained.
#[async_trait]
pub trait Requestor: Send + Sync {
    async fn request(&self, url: &str) -> Result<String, DecoctError>;
}

#[async_trait]
impl<T: Requestor + ?Sized> Requestor for std::sync::Arc<T> {
    async fn request(&self, url: &str) -> Result<String, DecoctError> {
        (**self).request(url).await
    }
}

/// Raw response captured by [`fetch`].
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text, using charset hints from the content-type header.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Requestor backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRequestor {
    opts: Options,
    http_client: reqwest::Client,
}

impl HttpRequestor {
    /// Start a builder with default options.
    pub fn builder() -> HttpRequestorBuilder {
        HttpRequestorBuilder::new()
    }

    /// Create a requestor, building an HTTP client from `opts` unless one was supplied.
    pub fn new(opts: Options) -> Self {
        let http_client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_http_client(&opts));
        Self { opts, http_client }
    }

    /// Options this requestor was built with.
    pub fn options(&self) -> &Options {
        &self.opts
    }
}

impl Default for HttpRequestor {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

#[async_trait]
impl Requestor for HttpRequestor {
    async fn request(&self, url: &str) -> Result<String, DecoctError> {
        let result = fetch(&self.http_client, url, &self.opts).await?;
        tracing::debug!(
            url,
            final_url = %result.final_url,
            status = result.status,
            bytes = result.body.len(),
            "fetched document"
        );
        Ok(result.text_utf8())
    }
}

fn build_http_client(opts: &Options) -> reqwest::Client {
    let allow_private = opts.allow_private_networks;
    let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
        if allow_private {
            return attempt.follow();
        }
        let next = attempt.url().clone();
        let Some(host) = next.host_str() else {
            return attempt.follow();
        };
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return attempt.error("redirect to private IP blocked");
            }
            return attempt.follow();
        }
        // synchronous DNS resolution to avoid async in redirect policy
        let port = next.port_or_known_default().unwrap_or(80);
        match (host, port).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.any(|sa| is_private_ip(&sa.ip())) {
                    attempt.error("redirect to private IP blocked")
                } else {
                    attempt.follow()
                }
            }
            Err(_) => attempt.error("DNS lookup failed during redirect"),
        }
    });

    reqwest::Client::builder()
        .redirect(redirect_policy)
        .user_agent(&opts.user_agent)
        .timeout(opts.timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .expect("failed to build HTTP client")
}

/// Check if an IP address is in a private/reserved range.
///
/// IPv4-mapped IPv6 addresses are judged by their IPv4 form.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4.iter().any(|net| net.contains(ip)),
        IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
            Some(v4) => is_private_ip(&IpAddr::V4(v4)),
            None => {
                ip.is_loopback()
                    || ip.is_unspecified()
                    || PRIVATE_V6.iter().any(|net| net.contains(ip))
            }
        },
    }
}

/// Reject `target` if its host is, or resolves to, a private address.
async fn ensure_public_host(target: &Url, url: &str, reason: &str) -> Result<(), DecoctError> {
    let Some(host) = target.host_str() else {
        return Ok(());
    };

    // IPv6 literals come back bracketed from host_str
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(DecoctError::ssrf(url, OP, Some(anyhow::anyhow!("{}", reason))));
        }
        return Ok(());
    }

    let port = target.port_or_known_default().unwrap_or(80);
    let mut addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        DecoctError::fetch(url, OP, Some(anyhow::anyhow!("DNS lookup failed: {}", e)))
    })?;
    if addrs.any(|sa| is_private_ip(&sa.ip())) {
        return Err(DecoctError::ssrf(url, OP, Some(anyhow::anyhow!("{}", reason))));
    }
    Ok(())
}

fn transport_error(url: &str, context: &str, err: reqwest::Error) -> DecoctError {
    if err.is_timeout() {
        DecoctError::timeout(url, OP, Some(anyhow::anyhow!("{}: {}", context, err)))
    } else {
        DecoctError::fetch(url, OP, Some(anyhow::anyhow!("{}: {}", context, err)))
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    content_type.to_lowercase().split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|charset| charset.trim_matches('"').trim_matches('\'').to_string())
    })
}

/// Fetch a resource from the given URL.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &Options,
) -> Result<FetchResult, DecoctError> {
    if url.is_empty() {
        return Err(DecoctError::invalid_url(url, OP, None));
    }

    let parsed_url = Url::parse(url).map_err(|e| {
        DecoctError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(DecoctError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if !opts.allow_private_networks {
        ensure_public_host(&parsed_url, url, "private IP addresses are not allowed").await?;
    }

    let mut request = client.get(url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(url, "request failed", e))?;

    // Redirects may land somewhere the first check never saw
    if !opts.allow_private_networks {
        ensure_public_host(
            response.url(),
            url,
            "redirect to private IP address is not allowed",
        )
        .await?;
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(DecoctError::fetch(
                url,
                OP,
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, "failed to read body", e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(DecoctError::fetch(
            url,
            OP,
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    if status != 200 && !opts.parse_non_200 {
        return Err(DecoctError::fetch(
            url,
            OP,
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    Ok(FetchResult {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn permissive() -> HttpRequestor {
        HttpRequestor::builder()
            .user_agent("test-agent")
            .allow_private_networks(true)
            .build()
    }

    #[tokio::test]
    async fn request_returns_body_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body>hello</body></html>");
        });

        let html = permissive().request(&server.url("/page")).await;
        mock.assert();

        assert_eq!(html.expect("request should succeed"), "<html><body>hello</body></html>");
    }

    #[tokio::test]
    async fn request_sends_configured_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/h")
                .header("x-reader", "decoct")
                .header("user-agent", "test-agent");
            then.status(200).body("<p>ok</p>");
        });

        let requestor = HttpRequestor::builder()
            .user_agent("test-agent")
            .allow_private_networks(true)
            .header("x-reader", "decoct")
            .build();

        let html = requestor.request(&server.url("/h")).await;
        mock.assert();
        assert_eq!(html.expect("request should succeed"), "<p>ok</p>");
    }

    #[tokio::test]
    async fn non_200_rejected_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/notfound");
            then.status(404).body("not found");
        });

        let err = permissive()
            .request(&server.url("/notfound"))
            .await
            .expect_err("should fail on 404");
        mock.assert();
        assert!(err.is_fetch());
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[tokio::test]
    async fn non_200_allowed_when_configured() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(410).body("<p>gone</p>");
        });

        let requestor = HttpRequestor::builder()
            .allow_private_networks(true)
            .parse_non_200(true)
            .build();
        let result = fetch(
            &reqwest::Client::new(),
            &server.url("/gone"),
            requestor.options(),
        )
        .await;
        mock.assert();

        let result = result.expect("fetch should succeed with parse_non_200");
        assert_eq!(result.status, 410);
        assert_eq!(result.text_utf8(), "<p>gone</p>");
    }

    #[tokio::test]
    async fn private_ip_blocked() {
        let server = MockServer::start();
        let requestor = HttpRequestor::default();

        let url = format!("http://127.0.0.1:{}/test", server.port());
        let err = requestor.request(&url).await.expect_err("should fail on private IP");
        assert!(err.is_ssrf());
        assert_eq!(err.target, url);
    }

    #[tokio::test]
    async fn invalid_urls_rejected() {
        let requestor = HttpRequestor::default();

        let err = requestor.request("").await.expect_err("empty url");
        assert!(err.is_invalid_url());

        let err = requestor.request("not a url").await.expect_err("garbage");
        assert!(err.is_invalid_url());

        let err = requestor
            .request("ftp://example.com/file")
            .await
            .expect_err("wrong scheme");
        assert!(err.is_invalid_url());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(std::time::Duration::from_millis(500))
                .body("late");
        });

        let requestor = HttpRequestor::builder()
            .allow_private_networks(true)
            .timeout(std::time::Duration::from_millis(50))
            .build();
        let err = requestor
            .request(&server.url("/slow"))
            .await
            .expect_err("should time out");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let server = MockServer::start();
        let body = "a".repeat(MAX_CONTENT_LENGTH + 1);
        let mock = server.mock(|when, then| {
            when.method(GET).path("/big");
            then.status(200).body(body);
        });

        let err = permissive()
            .request(&server.url("/big"))
            .await
            .expect_err("should reject oversized body");
        mock.assert();
        assert!(err.is_fetch());
        assert!(err.to_string().contains("content too large"));
    }

    #[tokio::test]
    async fn mapped_and_unspecified_loopback_blocked() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/secret");
            then.status(200).body("<p>internal</p>");
        });
        let requestor = HttpRequestor::default();

        for host in ["[::ffff:127.0.0.1]", "0.0.0.0", "[::]"] {
            let url = format!("http://{}:{}/secret", host, server.port());
            let err = requestor.request(&url).await.expect_err("should be blocked");
            assert!(err.is_ssrf(), "{} was not blocked: {}", host, err);
        }
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn public_host_check_rejects_private_literals() {
        for target in ["http://10.0.0.1/", "http://[::1]/", "http://[::ffff:192.168.1.1]/"] {
            let parsed = Url::parse(target).unwrap();
            let err = ensure_public_host(&parsed, target, "blocked")
                .await
                .expect_err("private host");
            assert!(err.is_ssrf(), "{} was not blocked", target);
            assert_eq!(err.target, target);
        }

        let public = Url::parse("http://93.184.216.34/").unwrap();
        ensure_public_host(&public, public.as_str(), "blocked")
            .await
            .expect("public literal passes");
    }

    #[test]
    fn private_v4_ranges() {
        assert!(is_private_ip(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_ip(&"172.31.255.255".parse().unwrap()));
        assert!(is_private_ip(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_ip(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"169.254.0.1".parse().unwrap()));

        assert!(is_private_ip(&"0.0.0.0".parse().unwrap()));
        assert!(is_private_ip(&"0.1.2.3".parse().unwrap()));

        assert!(!is_private_ip(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip(&"172.32.0.1".parse().unwrap()));
    }

    #[test]
    fn private_v6_ranges() {
        assert!(is_private_ip(&"::1".parse().unwrap()));
        assert!(is_private_ip(&"fd00::1".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));
        assert!(is_private_ip(&"::".parse().unwrap()));
        assert!(is_private_ip(&"::ffff:127.0.0.1".parse().unwrap()));
        assert!(is_private_ip(&"::ffff:10.1.2.3".parse().unwrap()));
        assert!(!is_private_ip(&"2001:4860:4860::8888".parse().unwrap()));
        assert!(!is_private_ip(&"::ffff:8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn charset_from_content_type() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn decode_uses_declared_charset() {
        // 0xe9 is e-acute in latin-1
        let bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_body(bytes, Some("text/html; charset=iso-8859-1")), "café");
        assert_eq!(decode_body(b"plain", Some("text/plain; charset=utf-8")), "plain");
    }

    #[test]
    fn decode_detects_charset_without_header() {
        // windows-1252 bytes, not valid UTF-8
        let bytes = b"<p>Le caf\xe9 est ferm\xe9 le dimanche, d\xe9sol\xe9.</p>";
        let text = decode_body(bytes, None);
        assert!(text.contains("café"), "got: {}", text);
        assert!(!text.contains('\u{FFFD}'));

        assert_eq!(decode_body(b"<p>ascii</p>", Some("text/html")), "<p>ascii</p>");
    }
}
