//! HTTP exchange primitives shared by the interceptor chain and the client.
//!
//! Requests and responses are fully buffered so that every stage of the chain can
//! inspect or replace a body without consuming a stream.

mod http;

pub use http::HttpTransport;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub data: Bytes,
    pub file_name: Option<String>,
    pub mime: Option<String>,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Bytes::from(value.into()),
            file_name: None,
            mime: None,
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            mime: Some(mime.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Raw bytes; the `Content-Type` header describes them.
    Bytes(Bytes),
    /// Multipart form. The transport sets the boundary content type.
    Multipart(Vec<MultipartPart>),
}

/// Buffered outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Some(RequestBody::Multipart(_)))
    }

    /// Byte body declared as JSON (multipart excluded).
    pub fn json_body(&self) -> Option<&Bytes> {
        let is_json = self
            .content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        match &self.body {
            Some(RequestBody::Bytes(b)) if is_json => Some(b),
            _ => None,
        }
    }

    pub fn set_json_body(&mut self, body: impl Into<Bytes>, content_type: &str) {
        if let Ok(v) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, v);
        }
        self.body = Some(RequestBody::Bytes(body.into()));
    }
}

/// Buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Reason phrase for the status, e.g. `"Internal Server Error"`.
    pub fn message(&self) -> String {
        self.status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| self.status.as_u16().to_string())
    }

    pub fn body_is_blank(&self) -> bool {
        self.body.iter().all(|b| b.is_ascii_whitespace())
    }
}

/// Terminal stage of the interceptor chain: performs the actual exchange.
pub trait Exchange: Send + Sync {
    fn exchange(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Request build failed: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let text = e.to_string();
        if e.is_timeout() || source_io_kind(&e) == Some(std::io::ErrorKind::TimedOut) {
            TransportError::Timeout(text)
        } else if e.is_connect() {
            TransportError::Connect(text)
        } else if e.is_builder() {
            TransportError::Build(text)
        } else if e.is_request() || e.is_body() || e.is_decode() || source_io_kind(&e).is_some() {
            TransportError::Io(text)
        } else {
            TransportError::Other(text)
        }
    }
}

fn source_io_kind(e: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut cur = e.source();
    while let Some(err) = cur {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        cur = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost/api").unwrap()
    }

    #[test]
    fn json_body_requires_json_content_type() {
        let mut req = HttpRequest::new(Method::POST, url());
        req.body = Some(RequestBody::Bytes(Bytes::from_static(b"{}")));
        assert!(req.json_body().is_none());
        req.set_json_body(Bytes::from_static(b"{}"), "application/json; charset=UTF-8");
        assert_eq!(req.json_body().map(|b| b.as_ref()), Some(&b"{}"[..]));
    }

    #[test]
    fn multipart_is_never_a_json_body() {
        let mut req = HttpRequest::new(Method::POST, url());
        req.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        req.body = Some(RequestBody::Multipart(vec![MultipartPart::text("a", "b")]));
        assert!(req.is_multipart());
        assert!(req.json_body().is_none());
    }

    #[test]
    fn response_message_and_blank_body() {
        let resp = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, " \n");
        assert_eq!(resp.message(), "Internal Server Error");
        assert!(resp.body_is_blank());
        assert!(!resp.is_success());
    }
}
