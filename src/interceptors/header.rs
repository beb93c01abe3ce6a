use super::{Interceptor, Next};
use crate::config::{AppInfo, OptionsCell};
use crate::credential::TokenManager;
use crate::transport::{HttpRequest, HttpResponse, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::sync::Arc;
use tracing::warn;

const PLATFORM: HeaderName = HeaderName::from_static("platform");
const TOKEN: HeaderName = HeaderName::from_static("token");
const VERSION_CODE: HeaderName = HeaderName::from_static("versioncode");
const VERSION_NAME: HeaderName = HeaderName::from_static("versionname");

/// Stamps every request with content negotiation, platform, credential and app
/// version headers, then any configured extra headers.
///
/// A body that already declares its own content type (forms, multipart) keeps it.
/// JSON requests always carry the JSON content type: the request builder sets it
/// on every JSON body, and bodiless requests get it here.
pub struct HeaderInterceptor {
    options: Arc<OptionsCell>,
    tokens: Arc<TokenManager>,
    app: AppInfo,
}

impl HeaderInterceptor {
    pub fn new(options: Arc<OptionsCell>, tokens: Arc<TokenManager>, app: AppInfo) -> Self {
        Self {
            options,
            tokens,
            app,
        }
    }

    fn apply(&self, headers: &mut HeaderMap, multipart: bool) {
        let opts = self.options.load();
        if !multipart && !headers.contains_key(CONTENT_TYPE) {
            set(headers, CONTENT_TYPE, &opts.content_type());
        }
        set(headers, ACCEPT, &opts.media_type);
        set(headers, PLATFORM, &opts.platform);
        if let Some(token) = self.tokens.token() {
            set(headers, TOKEN, &token);
        }
        if !self.app.version_code.is_empty() {
            set(headers, VERSION_CODE, &self.app.version_code);
        }
        if !self.app.version_name.is_empty() {
            set(headers, VERSION_NAME, &self.app.version_name);
        }
        for (name, value) in &opts.extra_headers {
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => set(headers, name, value),
                Err(_) => warn!(header = %name, "skipping invalid extra header name"),
            }
        }
    }
}

fn set(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => warn!(header = %name, "skipping header with invalid value"),
    }
}

impl Interceptor for HeaderInterceptor {
    fn intercept(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        let multipart = request.is_multipart();
        self.apply(&mut request.headers, multipart);
        next.proceed(request)
    }

    fn name(&self) -> &str {
        "header"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkOptions;
    use crate::credential::MemoryStore;
    use crate::interceptors::tests::RecordingExchange;
    use crate::interceptors::InterceptorChain;
    use crate::transport::{MultipartPart, RequestBody};
    use reqwest::{Method, StatusCode};
    use std::collections::HashMap;

    fn run(request: HttpRequest, token: Option<&str>) -> HttpRequest {
        let mut extra = HashMap::new();
        extra.insert("X-Channel".to_string(), "store".to_string());
        let options = Arc::new(OptionsCell::new(NetworkOptions {
            extra_headers: extra,
            ..Default::default()
        }));
        let tokens = Arc::new(TokenManager::new(Box::new(MemoryStore::new())));
        if let Some(t) = token {
            tokens.reset_token(t);
        }
        let app = AppInfo::new("demo").with_version("42", "4.2.0");
        let chain = InterceptorChain::new().with(HeaderInterceptor::new(options, tokens, app));
        let exchange = RecordingExchange::new(HttpResponse::new(StatusCode::OK, ""));
        chain.execute(request, &exchange).unwrap();
        exchange.last()
    }

    fn get() -> HttpRequest {
        HttpRequest::new(Method::GET, url::Url::parse("http://h/").unwrap())
    }

    #[test]
    fn injects_fixed_headers() {
        let sent = run(get(), Some("abc"));
        let h = &sent.headers;
        assert_eq!(h["content-type"], "application/json; charset=UTF-8");
        assert_eq!(h["accept"], "application/json");
        assert_eq!(h["platform"], "android");
        assert_eq!(h["token"], "abc");
        assert_eq!(h["versioncode"], "42");
        assert_eq!(h["versionname"], "4.2.0");
        assert_eq!(h["x-channel"], "store");
    }

    #[test]
    fn no_token_header_without_credential() {
        let sent = run(get(), None);
        assert!(sent.headers.get("token").is_none());
    }

    #[test]
    fn json_bodies_carry_json_content_type() {
        let mut post = get();
        post.method = Method::POST;
        post.set_json_body(&b"{}"[..], "application/json; charset=UTF-8");
        let sent = run(post, None);
        assert_eq!(sent.headers["content-type"], "application/json; charset=UTF-8");
        assert!(sent.json_body().is_some());
    }

    #[test]
    fn declared_body_types_are_kept() {
        let mut form = get();
        form.method = Method::POST;
        form.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let sent = run(form, None);
        assert_eq!(sent.headers["content-type"], "application/x-www-form-urlencoded");

        let mut multi = get();
        multi.body = Some(RequestBody::Multipart(vec![MultipartPart::text("a", "b")]));
        let sent = run(multi, None);
        assert!(sent.headers.get("content-type").is_none());
    }
}
