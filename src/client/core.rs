use super::adapter::LoginExpiredHook;
use super::builder::NetworkClientBuilder;
use super::call::RequestBuilder;
use crate::config::{NetworkOptions, OptionsCell};
use crate::credential::TokenManager;
use crate::interceptors::InterceptorChain;
use crate::security::SecurityManager;
use crate::transport::{Exchange, HttpRequest, HttpResponse, TransportError};
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use std::sync::Arc;
use url::Url;

pub(crate) struct ClientInner {
    pub(crate) options: Arc<OptionsCell>,
    pub(crate) security: Arc<SecurityManager>,
    pub(crate) tokens: Arc<TokenManager>,
    pub(crate) chain: InterceptorChain,
    pub(crate) exchange: Arc<dyn Exchange>,
    pub(crate) login_expired: Option<LoginExpiredHook>,
}

/// Shared network client. Clones are cheap and share one HTTP client,
/// connection pool and interceptor chain.
#[derive(Clone)]
pub struct NetworkClient {
    pub(crate) inner: Arc<ClientInner>,
}

/// A typed API surface bound to one base URL.
///
/// ```rust,no_run
/// use secure_rpc::{ApiResult, Endpoint, NetworkClient, Service};
///
/// struct AccountApi {
///     endpoint: Endpoint,
/// }
///
/// impl Service for AccountApi {
///     fn bind(endpoint: Endpoint) -> Self {
///         Self { endpoint }
///     }
/// }
///
/// impl AccountApi {
///     fn profile(&self, id: u64) -> ApiResult<serde_json::Value> {
///         self.endpoint.get("user/profile").query("id", id).execute()
///     }
/// }
///
/// # fn main() -> secure_rpc::Result<()> {
/// let client = NetworkClient::builder().build()?;
/// let api: AccountApi = client.create_service("https://api.example.com/v1/")?;
/// let profile = api.profile(7);
/// # Ok(())
/// # }
/// ```
pub trait Service: Sized {
    fn bind(endpoint: Endpoint) -> Self;
}

impl NetworkClient {
    pub fn builder() -> NetworkClientBuilder {
        NetworkClientBuilder::new()
    }

    /// Bind a typed service to `base_url`. Any number of services and base URLs
    /// may share this client.
    pub fn create_service<S: Service>(&self, base_url: &str) -> Result<S> {
        Ok(S::bind(self.endpoint(base_url)?))
    }

    pub fn endpoint(&self, base_url: &str) -> Result<Endpoint> {
        let mut base = Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid base url",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", base_url, e)),
            )
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::configuration_with_context(
                "base url cannot carry paths",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base_url.to_string()),
            ));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Endpoint {
            client: self.clone(),
            base,
        })
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<NetworkOptions> {
        self.inner.options.load()
    }

    /// Replace the options as a whole. Timeouts and proxy are fixed when the
    /// HTTP client is built and are not affected.
    pub fn update_options(&self, options: NetworkOptions) -> Result<()> {
        self.inner.options.update_options(options)
    }

    pub fn security(&self) -> &SecurityManager {
        &self.inner.security
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }

    pub fn interceptor_names(&self) -> Vec<&str> {
        self.inner.chain.names()
    }

    pub(crate) fn login_expired_hook(&self) -> Option<&LoginExpiredHook> {
        self.inner.login_expired.as_ref()
    }

    pub(crate) fn dispatch(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        self.inner.chain.execute(request, self.inner.exchange.as_ref())
    }
}

/// A base URL on a shared client; the building block of [`Service`] types.
#[derive(Clone)]
pub struct Endpoint {
    client: NetworkClient,
    base: Url,
}

impl Endpoint {
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn client(&self) -> &NetworkClient {
        &self.client
    }

    /// Relative paths resolve under the base URL; a leading `/` resolves from the host root.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.base.join(path).map_err(|e| {
            Error::configuration_with_context(
                "invalid request path",
                ErrorContext::new()
                    .with_field_path("path")
                    .with_details(format!("{}: {}", path, e)),
            )
        });
        RequestBuilder::new(self.client.clone(), method, url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }
}
