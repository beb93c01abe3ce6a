use super::{Interceptor, Next};
use crate::codec::seal_json_body;
use crate::config::OptionsCell;
use crate::security::{no_secret, SecurityManager};
use crate::transport::{HttpRequest, HttpResponse, TransportError};
use crate::Result;
use reqwest::Method;
use std::sync::Arc;
use tracing::warn;

/// Signs and encrypts JSON POST bodies when `encrypt_params` is enabled.
///
/// Fail-open: if the body cannot be sealed (no secret installed, body is not a
/// JSON object, cipher failure) the original request is sent unchanged.
pub struct ParamsInterceptor {
    options: Arc<OptionsCell>,
    security: Arc<SecurityManager>,
}

impl ParamsInterceptor {
    pub fn new(options: Arc<OptionsCell>, security: Arc<SecurityManager>) -> Self {
        Self { options, security }
    }

    fn seal(&self, body: &[u8]) -> Result<Vec<u8>> {
        let ctx = self.security.snapshot().ok_or_else(no_secret)?;
        seal_json_body(body, &ctx)
    }
}

impl Interceptor for ParamsInterceptor {
    fn intercept(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let opts = self.options.load();
        if opts.encrypt_params && request.method == Method::POST {
            let sealed = request.json_body().map(|body| self.seal(body));
            match sealed {
                Some(Ok(sealed)) => request.set_json_body(sealed, &opts.content_type()),
                Some(Err(e)) => warn!(url = %request.url, error = %e, "sending request body unsealed"),
                None => {}
            }
        }
        next.proceed(request)
    }

    fn name(&self) -> &str {
        "params"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RequestEnvelope;
    use crate::config::NetworkOptions;
    use crate::interceptors::tests::RecordingExchange;
    use crate::interceptors::InterceptorChain;
    use crate::security::CryptoScheme;
    use crate::transport::{MultipartPart, RequestBody};
    use reqwest::StatusCode;

    const BODY: &[u8] = br#"{"b":2,"a":"x"}"#;

    fn setup(encrypt: bool, secret: bool) -> (InterceptorChain, RecordingExchange, Arc<SecurityManager>) {
        let options = Arc::new(OptionsCell::new(NetworkOptions {
            encrypt_params: encrypt,
            ..Default::default()
        }));
        let security = Arc::new(SecurityManager::new());
        if secret {
            security.reset_secret(CryptoScheme::Aes, "k").unwrap();
        }
        let chain = InterceptorChain::new().with(ParamsInterceptor::new(options, security.clone()));
        let exchange = RecordingExchange::new(HttpResponse::new(StatusCode::OK, "{}"));
        (chain, exchange, security)
    }

    fn post(body: &'static [u8]) -> HttpRequest {
        let mut req = HttpRequest::new(Method::POST, url::Url::parse("http://h/p").unwrap());
        req.set_json_body(body, "application/json");
        req
    }

    #[test]
    fn post_json_body_is_sealed() {
        let (chain, exchange, security) = setup(true, true);
        chain.execute(post(BODY), &exchange).unwrap();

        let sent = exchange.last();
        let env: RequestEnvelope = serde_json::from_slice(sent.json_body().unwrap()).unwrap();
        assert_eq!(Some(env.sign_data), security.sign("axb2"));
        assert!(sent.content_type().unwrap().starts_with("application/json"));
    }

    #[test]
    fn missing_secret_sends_original_body() {
        let (chain, exchange, _) = setup(true, false);
        chain.execute(post(BODY), &exchange).unwrap();
        assert_eq!(&exchange.last().json_body().unwrap()[..], BODY);
    }

    #[test]
    fn non_object_body_sends_original_body() {
        let (chain, exchange, _) = setup(true, true);
        chain.execute(post(b"[1,2,3]"), &exchange).unwrap();
        assert_eq!(&exchange.last().json_body().unwrap()[..], b"[1,2,3]");
    }

    #[test]
    fn disabled_option_get_and_multipart_are_untouched() {
        let (chain, exchange, _) = setup(false, true);
        chain.execute(post(BODY), &exchange).unwrap();
        assert_eq!(&exchange.last().json_body().unwrap()[..], BODY);

        let (chain, exchange, _) = setup(true, true);
        let mut get = post(BODY);
        get.method = Method::GET;
        chain.execute(get, &exchange).unwrap();
        assert_eq!(&exchange.last().json_body().unwrap()[..], BODY);

        let mut multi = post(BODY);
        multi.body = Some(RequestBody::Multipart(vec![MultipartPart::text("a", "1")]));
        chain.execute(multi, &exchange).unwrap();
        assert!(exchange.last().is_multipart());
    }
}
