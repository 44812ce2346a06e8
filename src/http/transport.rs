//! Transport seam — one request in, one response out.
//!
//! `CapitalHttp` layers retry, timeouts and status mapping on top of a
//! [`Transport`]. Production code uses [`ReqwestTransport`]; tests plug in
//! scripted transports.

use crate::error::HttpError;
use crate::network::{API_KEY_HEADER, CST_HEADER, SECURITY_TOKEN_HEADER};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outbound request.
///
/// `Debug` masks credential headers and omits the body, which may carry the
/// login password.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as returned by the transport, before status handling.
/// `Debug` masks session headers.
#[derive(Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.body.trim().is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_str(&self.body)
        }
    }
}

// ─── Redaction ───────────────────────────────────────────────────────────────

const SENSITIVE_HEADERS: [&str; 3] = [API_KEY_HEADER, SECURITY_TOKEN_HEADER, CST_HEADER];

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Header pairs with credential values replaced by `***`.
fn redact_headers<'a>(
    headers: impl Iterator<Item = (&'a String, &'a String)>,
) -> Vec<(&'a str, &'a str)> {
    headers
        .map(|(name, value)| {
            let value = if is_sensitive(name) { "***" } else { value.as_str() };
            (name.as_str(), value)
        })
        .collect()
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redact_headers(self.headers.iter().map(|(k, v)| (k, v))))
            .field("body", &self.body.as_ref().map(|_| "<json>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &redact_headers(self.headers.iter()))
            .field("body", &self.body)
            .finish()
    }
}

/// Sends a single HTTP request. No retries, no status interpretation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

// ─── reqwest ─────────────────────────────────────────────────────────────────

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = resp.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_headers_case_insensitive() {
        let resp = HttpResponse::new(200, "")
            .with_header("X-SECURITY-TOKEN", "tok")
            .with_header("cst", "c");
        assert_eq!(resp.header("x-security-token"), Some("tok"));
        assert_eq!(resp.header("CST"), Some("c"));
        assert_eq!(resp.header("missing"), None);
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let resp = HttpResponse::new(200, "  ");
        let v: serde_json::Value = resp.json().unwrap();
        assert!(v.is_null());
        let opt: Option<u32> = resp.json().unwrap();
        assert!(opt.is_none());
    }

    #[test]
    fn test_request_header_lookup() {
        let req = HttpRequest::new(Method::Get, "https://example.com")
            .header("X-Request-ID", "abc");
        assert_eq!(req.header_value("x-request-id"), Some("abc"));
        assert_eq!(req.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_request_debug_masks_credentials() {
        let req = HttpRequest::new(Method::Post, "https://broker.test/api/v1/session")
            .header(API_KEY_HEADER, "key-123")
            .header("x-security-token", "tok-456")
            .header(CST_HEADER, "cst-789")
            .header("X-Request-ID", "LOGIN-1")
            .json(serde_json::json!({
                "identifier": "me@example.com",
                "password": "hunter2",
                "encryptedPassword": false
            }));

        let debug = format!("{req:?}");
        for secret in ["key-123", "tok-456", "cst-789", "hunter2", "me@example.com"] {
            assert!(!debug.contains(secret), "{secret} leaked: {debug}");
        }
        assert!(debug.contains("LOGIN-1"));
        assert!(debug.contains("<json>"));
    }

    #[test]
    fn test_response_debug_masks_session_headers() {
        let resp = HttpResponse::new(200, "{}")
            .with_header(SECURITY_TOKEN_HEADER, "tok-456")
            .with_header(CST_HEADER, "cst-789")
            .with_header("Content-Type", "application/json");
        let debug = format!("{resp:?}");
        assert!(!debug.contains("tok-456"));
        assert!(!debug.contains("cst-789"));
        assert!(debug.contains("application/json"));
    }
}
