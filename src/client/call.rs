use super::adapter;
use super::core::NetworkClient;
use super::result::ApiResult;
use crate::transport::{HttpRequest, MultipartPart, RequestBody};
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use url::Url;

/// Builds one request against an [`Endpoint`](super::Endpoint).
///
/// Errors (bad path, unserializable body, invalid header) are deferred and
/// surface as a service-error [`ApiResult`] when the call runs.
pub struct RequestBuilder {
    client: NetworkClient,
    request: Result<HttpRequest>,
}

impl RequestBuilder {
    pub(crate) fn new(client: NetworkClient, method: Method, url: Result<Url>) -> Self {
        let request = url.map(|url| HttpRequest::new(method, url));
        Self { client, request }
    }

    fn update(mut self, f: impl FnOnce(&mut HttpRequest) -> Result<()>) -> Self {
        if let Ok(req) = self.request.as_mut() {
            if let Err(e) = f(req) {
                self.request = Err(e);
            }
        }
        self
    }

    pub fn query(self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        self.update(|req| {
            req.url.query_pairs_mut().append_pair(key, &value);
            Ok(())
        })
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        self.update(|req| {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid_header(name, e))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid_header(name.as_str(), e))?;
            req.headers.insert(name, value);
            Ok(())
        })
    }

    /// JSON body. Eligible for signing and encryption on POST.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Self {
        let content_type = self.client.options().content_type();
        let encoded = serde_json::to_vec(body);
        self.update(move |req| {
            req.set_json_body(encoded?, &content_type);
            Ok(())
        })
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn form<K: AsRef<str>, V: AsRef<str>>(self, fields: &[(K, V)]) -> Self {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            ser.append_pair(k.as_ref(), v.as_ref());
        }
        let encoded = ser.finish();
        self.update(move |req| {
            req.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            req.body = Some(RequestBody::Bytes(Bytes::from(encoded)));
            Ok(())
        })
    }

    /// Multipart body. Never signed or encrypted.
    pub fn multipart(self, parts: Vec<MultipartPart>) -> Self {
        self.update(move |req| {
            req.body = Some(RequestBody::Multipart(parts));
            Ok(())
        })
    }

    pub fn call<T: DeserializeOwned>(self) -> Call<T> {
        Call {
            client: self.client,
            request: self.request,
            _marker: PhantomData,
        }
    }

    /// Shorthand for `self.call::<T>().execute()`.
    pub fn execute<T: DeserializeOwned>(self) -> ApiResult<T> {
        self.call::<T>().execute()
    }
}

fn invalid_header(name: &str, e: impl std::fmt::Display) -> Error {
    Error::configuration_with_context(
        "invalid header",
        ErrorContext::new()
            .with_field_path(name)
            .with_details(e.to_string()),
    )
}

/// A prepared call yielding `ApiResult<T>`.
pub struct Call<T> {
    client: NetworkClient,
    request: Result<HttpRequest>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Call<T> {
    /// Run on the current thread, blocking until the call completes. No retries.
    pub fn execute(self) -> ApiResult<T> {
        adapter::execute(&self.client, self.request)
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref().ok()
    }
}

impl<T: DeserializeOwned + Send + 'static> Call<T> {
    /// Run [`execute`](Self::execute) on tokio's blocking pool. Same single-result
    /// contract; must be awaited inside a tokio runtime.
    pub async fn execute_async(self) -> ApiResult<T> {
        let options = self.client.options();
        match tokio::task::spawn_blocking(move || self.execute()).await {
            Ok(result) => result,
            Err(e) => ApiResult::failure(options.service_error_code, e.to_string())
                .with_success_code(options.success_code),
        }
    }
}
