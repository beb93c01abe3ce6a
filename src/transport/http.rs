use super::{Exchange, HttpRequest, HttpResponse, RequestBody, TransportError};
use crate::config::NetworkOptions;
use crate::Result;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// Shared blocking HTTP client. One instance serves every service and base URL;
/// the underlying connection pool is safe for concurrent use.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(options: &NetworkOptions) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(options.connect_timeout())
            .timeout(options.request_timeout())
            .pool_max_idle_per_host(
                env::var("SECURE_RPC_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(16),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = options.proxy_url.as_deref() {
            if let Ok(proxy) = Proxy::all(proxy_url) {
                builder = builder.proxy(proxy);
            } else {
                tracing::warn!(proxy = proxy_url, "ignoring unparsable proxy url");
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Build(e.to_string())))?;

        Ok(Self { client })
    }

    fn multipart(parts: Vec<super::MultipartPart>) -> std::result::Result<Form, TransportError> {
        let mut form = Form::new();
        for p in parts {
            let mut part = Part::bytes(p.data.to_vec());
            if let Some(name) = p.file_name {
                part = part.file_name(name);
            }
            if let Some(mime) = p.mime.as_deref() {
                part = part.mime_str(mime)?;
            }
            form = form.part(p.name, part);
        }
        Ok(form)
    }
}

impl Exchange for HttpTransport {
    fn exchange(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        let mut req = self.client.request(method, url);
        req = match body {
            Some(RequestBody::Bytes(data)) => req.body(data.to_vec()),
            Some(RequestBody::Multipart(parts)) => {
                // The form supplies its own boundary content type.
                headers.remove(reqwest::header::CONTENT_TYPE);
                req.multipart(Self::multipart(parts)?)
            }
            None => req,
        };
        let resp = req.headers(headers).send()?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes()?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
