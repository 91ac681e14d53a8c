//! # HTTP Request Wrapper
//!
//! Request wrapper over hyper types, implementing the core's parameter
//! source interface.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Only wraps request data; binding and validation live in the core
//! - **O**: Extensible via new accessors without breaking changes
//! - **D**: The core sees only the `ParamSource` trait, never hyper types
//!
//! Query parameters are parsed once at construction, with URL decoding and
//! native multi-value support (repeated keys accumulate). Cookies come from
//! the `Cookie` request headers. Path parameters are injected by whatever
//! router matched the request. The body is collected a single time, bounded
//! by an optional size limit.

use crate::error::{AdapterError, Result};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use std::collections::HashMap;
use tracing::debug;
use wirebind_core::{Method, ParamSource};

/// Convert a hyper method to the core's method type
///
/// Unrecognized methods fall back to GET, which never carries a payload.
#[must_use]
pub fn method_from_hyper(method: &hyper::Method) -> Method {
    match *method {
        hyper::Method::POST => Method::Post,
        hyper::Method::PUT => Method::Put,
        hyper::Method::DELETE => Method::Delete,
        hyper::Method::PATCH => Method::Patch,
        hyper::Method::HEAD => Method::Head,
        hyper::Method::OPTIONS => Method::Options,
        _ => Method::Get,
    }
}

/// HTTP request wrapper backing the core's [`ParamSource`] interface
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP method
    method: Method,
    /// Request path (without query string)
    path: String,
    /// Raw query string (e.g. "page=1&limit=10")
    query_string: Option<String>,
    /// Parsed query parameters; repeated keys accumulate in order
    query_params: HashMap<String, Vec<String>>,
    /// Request headers
    headers: hyper::HeaderMap,
    /// Parsed request cookies
    cookies: HashMap<String, String>,
    /// Router-injected path parameters
    path_params: HashMap<String, String>,
    /// Request body (collected)
    body: Option<Bytes>,
}

impl WireRequest {
    /// Create a request manually (for testing/internal use)
    #[must_use]
    pub fn new(method: Method, path: String, headers_map: HashMap<String, String>, body: Option<Bytes>) -> Self {
        let (path, query_string) = if let Some((p, q)) = path.split_once('?') {
            (p.to_string(), Some(q.to_string()))
        } else {
            (path, None)
        };

        let query_params = parse_query_string(query_string.as_deref());

        let mut headers = hyper::HeaderMap::new();
        for (k, v) in headers_map {
            if let (Ok(name), Ok(value)) = (
                hyper::header::HeaderName::from_bytes(k.as_bytes()),
                hyper::header::HeaderValue::from_str(&v),
            ) {
                headers.append(name, value);
            }
        }
        let cookies = parse_cookies(&headers);

        Self {
            method,
            path,
            query_string,
            query_params,
            headers,
            cookies,
            path_params: HashMap::new(),
            body,
        }
    }

    /// Create from a hyper request, collecting the whole body
    ///
    /// # Errors
    ///
    /// Never fails on its own; see
    /// [`from_hyper_with_limit`](WireRequest::from_hyper_with_limit).
    pub async fn from_hyper<B>(req: hyper::Request<B>) -> Result<Self>
    where
        B: hyper::body::Body,
    {
        Self::from_hyper_with_limit(req, usize::MAX).await
    }

    /// Create from a hyper request with a body size limit
    ///
    /// The limit is enforced twice: against the declared `Content-Length`
    /// before collection, and against the actually collected size. A body
    /// that fails to collect is treated as absent, never as an error.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::PayloadTooLarge` when either check fails.
    pub async fn from_hyper_with_limit<B>(req: hyper::Request<B>, max_body_size: usize) -> Result<Self>
    where
        B: hyper::body::Body,
    {
        let method = method_from_hyper(req.method());

        let uri = req.uri();
        let path = uri.path().to_string();
        let query_string = uri.query().map(String::from);
        let query_params = parse_query_string(query_string.as_deref());

        let headers = req.headers().clone();
        if let Some(declared) = headers.get(hyper::header::CONTENT_LENGTH) {
            if let Ok(declared) = declared.to_str() {
                if let Ok(content_len) = declared.parse::<usize>() {
                    if content_len > max_body_size {
                        return Err(AdapterError::PayloadTooLarge {
                            limit: max_body_size,
                            actual: content_len,
                        });
                    }
                }
            }
        }
        let cookies = parse_cookies(&headers);

        let body = match BodyExt::collect(req.into_body()).await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                if bytes.len() > max_body_size {
                    return Err(AdapterError::PayloadTooLarge {
                        limit: max_body_size,
                        actual: bytes.len(),
                    });
                }
                Some(bytes)
            }
            Err(_) => {
                debug!("Body collection failed; treating body as absent");
                None
            }
        };

        Ok(Self {
            method,
            path,
            query_string,
            query_params,
            headers,
            cookies,
            path_params: HashMap::new(),
            body,
        })
    }

    /// The request path, without the query string
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Inject a router-matched path parameter
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(name.into(), value.into());
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Get the request body as a UTF-8 string
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl ParamSource for WireRequest {
    fn method(&self) -> Method {
        self.method
    }

    fn path_param(&self, name: &str) -> Option<String> {
        self.path_params.get(name).cloned()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query_params.get(name).and_then(|values| values.first().cloned())
    }

    fn header_param(&self, name: &str) -> Option<String> {
        self.header(name).map(ToString::to_string)
    }

    fn cookie_param(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn query_params(&self, name: &str) -> Option<Vec<String>> {
        self.query_params.get(name).cloned()
    }

    fn header_params(&self, name: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok().map(ToString::to_string))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Parse a query string into a multi-value map
///
/// Handles URL decoding; repeated keys accumulate in order of appearance.
fn parse_query_string(query: Option<&str>) -> HashMap<String, Vec<String>> {
    let Some(query) = query else {
        return HashMap::new();
    };

    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.entry(url_decode(key)).or_default().push(url_decode(value));
    }
    params
}

/// Parse request cookies from the `Cookie` headers
///
/// Pairs are `;`-separated; surrounding whitespace is trimmed; a repeated
/// cookie name keeps the first value.
fn parse_cookies(headers: &hyper::HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(hyper::header::COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            cookies.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
    }
    cookies
}

/// Basic URL decoding
///
/// Decodes `+` and percent-escapes at the byte level, so multi-byte UTF-8
/// escapes reassemble correctly.
fn url_decode(s: &str) -> String {
    let raw = s.as_bytes();
    let mut decoded = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < raw.len() => {
                let hex = std::str::from_utf8(&raw[i + 1..i + 3]).unwrap_or("");
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    decoded.push(byte);
                    i += 3;
                } else {
                    decoded.push(b'%');
                    i += 1;
                }
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn get(path: &str) -> WireRequest {
        WireRequest::new(Method::Get, path.to_string(), HashMap::new(), None)
    }

    #[test]
    fn test_query_parsing_multi_value() {
        let request = get("/search?tag=a&tag=b&limit=10");
        assert_eq!(request.query_param("limit"), Some("10".to_string()));
        assert_eq!(request.query_param("tag"), Some("a".to_string()));
        assert_eq!(
            request.query_params("tag"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(request.query_params("missing"), None);
    }

    #[test]
    fn test_query_url_decoding() {
        let request = get("/search?name=John+Doe&city=New%20York&pct=100%25");
        assert_eq!(request.query_param("name"), Some("John Doe".to_string()));
        assert_eq!(request.query_param("city"), Some("New York".to_string()));
        assert_eq!(request.query_param("pct"), Some("100%".to_string()));
    }

    #[test]
    fn test_url_decode_multibyte() {
        assert_eq!(url_decode("caf%C3%A9"), "café");
        assert_eq!(url_decode("100%2x"), "100%2x");
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HashMap::new();
        headers.insert("Cookie".to_string(), "sid=abc123; theme=dark".to_string());
        let request = WireRequest::new(Method::Get, "/".to_string(), headers, None);

        assert_eq!(request.cookie_param("sid"), Some("abc123".to_string()));
        assert_eq!(request.cookie_param("theme"), Some("dark".to_string()));
        assert_eq!(request.cookie_param("missing"), None);
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("X-Auth-Token".to_string(), "secret".to_string());
        let request = WireRequest::new(Method::Get, "/".to_string(), headers, None);

        assert_eq!(request.header_param("x-auth-token"), Some("secret".to_string()));
        assert_eq!(request.header_param("X-AUTH-TOKEN"), Some("secret".to_string()));
    }

    #[test]
    fn test_path_params_injected_by_router() {
        let mut request = get("/users/42");
        assert_eq!(request.path_param("id"), None);

        request.set_path_param("id", "42");
        assert_eq!(request.path_param("id"), Some("42".to_string()));
    }

    #[tokio::test]
    async fn test_from_hyper_collects_body() {
        let req = hyper::Request::builder()
            .method(hyper::Method::POST)
            .uri("/upload?kind=raw")
            .header("Content-Type", "application/octet-stream")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let request = WireRequest::from_hyper(req).await.unwrap();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/upload");
        assert_eq!(request.query_param("kind"), Some("raw".to_string()));
        assert_eq!(request.body_bytes(), Some(&b"payload"[..]));
        assert_eq!(request.body_str(), Some("payload"));
    }

    #[tokio::test]
    async fn test_from_hyper_limit_on_collected_size() {
        let req = hyper::Request::builder()
            .method(hyper::Method::POST)
            .uri("/upload")
            .body(Full::new(Bytes::from(vec![0u8; 64])))
            .unwrap();

        let err = WireRequest::from_hyper_with_limit(req, 16).await.unwrap_err();
        assert!(matches!(err, AdapterError::PayloadTooLarge { limit: 16, actual: 64 }));
    }

    #[tokio::test]
    async fn test_from_hyper_limit_on_content_length() {
        let req = hyper::Request::builder()
            .method(hyper::Method::POST)
            .uri("/upload")
            .header(hyper::header::CONTENT_LENGTH, "1000000")
            .body(Full::new(Bytes::from_static(b"small")))
            .unwrap();

        let err = WireRequest::from_hyper_with_limit(req, 1024).await.unwrap_err();
        assert!(matches!(err, AdapterError::PayloadTooLarge { limit: 1024, .. }));
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(method_from_hyper(&hyper::Method::POST), Method::Post);
        assert_eq!(method_from_hyper(&hyper::Method::PATCH), Method::Patch);
        assert_eq!(method_from_hyper(&hyper::Method::GET), Method::Get);
        // fallback
        assert_eq!(
            method_from_hyper(&hyper::Method::from_bytes(b"PROPFIND").unwrap()),
            Method::Get
        );
    }
}
