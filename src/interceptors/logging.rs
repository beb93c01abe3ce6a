use super::{Interceptor, Next};
use crate::config::OptionsCell;
use crate::transport::{HttpRequest, HttpResponse, RequestBody, TransportError};
use reqwest::header::HeaderMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, Level};
use uuid::Uuid;

const MASKED_HEADERS: &[&str] = &["token", "authorization", "cookie"];

/// Logs every request and response at `DEBUG`.
///
/// Bodies are read from the buffered copies and never consumed. Any failure
/// while rendering diagnostics is swallowed.
pub struct LoggingInterceptor {
    options: Arc<OptionsCell>,
}

impl LoggingInterceptor {
    pub fn new(options: Arc<OptionsCell>) -> Self {
        Self { options }
    }

    fn log_request(&self, id: &Uuid, request: &HttpRequest) {
        let opts = self.options.load();
        let body = match &request.body {
            Some(_) if !opts.log_bodies => "<omitted>".to_string(),
            Some(RequestBody::Bytes(b)) => preview(b, opts.log_body_limit),
            Some(RequestBody::Multipart(parts)) => format!("<multipart: {} parts>", parts.len()),
            None => String::new(),
        };
        debug!(
            request_id = %id,
            method = %request.method,
            url = %request.url,
            headers = %render_headers(&request.headers),
            body = %body,
            "--> request"
        );
    }

    fn log_response(
        &self,
        id: &Uuid,
        started: Instant,
        result: &Result<HttpResponse, TransportError>,
    ) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(resp) => {
                let opts = self.options.load();
                let body = if opts.log_bodies {
                    preview(&resp.body, opts.log_body_limit)
                } else {
                    "<omitted>".to_string()
                };
                debug!(
                    request_id = %id,
                    status = resp.status.as_u16(),
                    elapsed_ms,
                    headers = %render_headers(&resp.headers),
                    body = %body,
                    "<-- response"
                );
            }
            Err(e) => debug!(request_id = %id, elapsed_ms, error = %e, "<-- failed"),
        }
    }
}

impl Interceptor for LoggingInterceptor {
    fn intercept(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        if !tracing::enabled!(Level::DEBUG) {
            return next.proceed(request);
        }
        let id = Uuid::new_v4();
        let _ = catch_unwind(AssertUnwindSafe(|| self.log_request(&id, &request)));
        let started = Instant::now();
        let result = next.proceed(request);
        let _ = catch_unwind(AssertUnwindSafe(|| self.log_response(&id, started, &result)));
        result
    }

    fn name(&self) -> &str {
        "logging"
    }
}

fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if MASKED_HEADERS.contains(&name.as_str()) {
                "***"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{}: {}", name, shown)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn preview(body: &[u8], limit: usize) -> String {
    if body.len() <= limit {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!(
        "{}... ({} bytes)",
        String::from_utf8_lossy(&body[..limit]),
        body.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptors::tests::RecordingExchange;
    use crate::interceptors::InterceptorChain;
    use reqwest::header::HeaderValue;
    use reqwest::{Method, StatusCode};

    #[test]
    fn token_is_masked() {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("secret-token"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        let text = render_headers(&headers);
        assert!(text.contains("token: ***"));
        assert!(!text.contains("secret-token"));
        assert!(text.contains("accept: application/json"));
    }

    #[test]
    fn preview_truncates_on_limit() {
        assert_eq!(preview(b"abc", 10), "abc");
        assert_eq!(preview(b"abcdef", 3), "abc... (6 bytes)");
        assert_eq!(preview(&[0xff, b'a'], 10), "\u{fffd}a");
    }

    #[test]
    fn request_and_response_pass_through_untouched() {
        let chain = InterceptorChain::new()
            .with(LoggingInterceptor::new(Arc::new(OptionsCell::default())));
        let exchange = RecordingExchange::new(HttpResponse::new(StatusCode::OK, "{\"code\":200}"));
        let mut req = HttpRequest::new(Method::POST, url::Url::parse("http://h/p").unwrap());
        req.set_json_body(&b"{\"a\":1}"[..], "application/json");

        let resp = chain.execute(req, &exchange).unwrap();
        assert_eq!(&resp.body[..], b"{\"code\":200}");
        assert_eq!(exchange.last().json_body().map(|b| b.to_vec()), Some(b"{\"a\":1}".to_vec()));
    }
}
