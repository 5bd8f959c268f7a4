//! 传输层：提供者请求的描述与执行。
//!
//! Transport layer. A [`ProviderRequest`] is the concrete HTTP call a provider wants made;
//! a [`Transport`] executes it and hands back the raw payload as a [`RawResponse`].

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// How the transport should decode a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Parse the body as JSON; a parse failure is a malformed payload.
    Json,
    /// Keep the body as a JSON string value.
    Text,
    /// Ignore the body (HEAD probes); the payload is `null`.
    Empty,
}

/// Concrete HTTP request built by a provider for one capability request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub expect: ResponseFormat,
}

impl ProviderRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            expect: ResponseFormat::Json,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url).expect(ResponseFormat::Empty)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn expect(mut self, format: ResponseFormat) -> Self {
        self.expect = format;
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first header named `key` (case-insensitive).
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Successful upstream response, decoded according to [`ResponseFormat`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL of the request (after redirects).
    pub url: String,
    pub body: Value,
}

impl RawResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            url: String::new(),
            body,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::json(Value::String(body.into()))
    }
}

/// Executes provider requests. One call, one attempt: implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ProviderRequest) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP status {status}")]
    Status { status: u16, body: String },

    #[error("cannot decode response body: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
