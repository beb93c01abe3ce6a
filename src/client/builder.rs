use super::adapter::{LoginExpired, LoginExpiredHook};
use super::core::{ClientInner, NetworkClient};
use crate::config::{self, AppInfo, NetworkOptions, OptionsCell};
use crate::credential::TokenManager;
use crate::interceptors::{
    DataSecurityInterceptor, HeaderInterceptor, Interceptor, InterceptorChain,
    LoggingInterceptor, ParamsInterceptor,
};
use crate::security::SecurityManager;
use crate::transport::{Exchange, HttpTransport};
use crate::Result;
use std::sync::Arc;

/// Builder for [`NetworkClient`].
///
/// Keep this surface area small and predictable.
pub struct NetworkClientBuilder {
    options: Option<Arc<OptionsCell>>,
    app: AppInfo,
    security: Option<Arc<SecurityManager>>,
    tokens: Option<Arc<TokenManager>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    exchange: Option<Arc<dyn Exchange>>,
    login_expired: Option<LoginExpiredHook>,
}

impl NetworkClientBuilder {
    pub fn new() -> Self {
        Self {
            options: None,
            app: AppInfo::default(),
            security: None,
            tokens: None,
            interceptors: Vec::new(),
            exchange: None,
            login_expired: None,
        }
    }

    /// Use a private options cell seeded with `options` instead of the
    /// process-wide one.
    pub fn options(mut self, options: NetworkOptions) -> Self {
        self.options = Some(Arc::new(OptionsCell::new(options)));
        self
    }

    /// Share an existing options cell.
    pub fn options_cell(mut self, cell: Arc<OptionsCell>) -> Self {
        self.options = Some(cell);
        self
    }

    pub fn app_info(mut self, app: AppInfo) -> Self {
        self.app = app;
        self
    }

    pub fn security(mut self, security: Arc<SecurityManager>) -> Self {
        self.security = Some(security);
        self
    }

    pub fn token_manager(mut self, tokens: Arc<TokenManager>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Add an interceptor after the header stage.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replace the HTTP exchange (primarily for tests and custom transports).
    pub fn exchange(mut self, exchange: Arc<dyn Exchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Called whenever a call produces the configured login-error code.
    pub fn on_login_expired<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoginExpired) + Send + Sync + 'static,
    {
        self.login_expired = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<NetworkClient> {
        let options = self.options.unwrap_or_else(config::global);
        let snapshot = options.load();
        snapshot.validate()?;

        let security = self
            .security
            .unwrap_or_else(|| Arc::new(SecurityManager::new()));
        let tokens = match self.tokens {
            Some(t) => t,
            None => {
                let service = if self.app.app_id.is_empty() {
                    "secure-rpc".to_string()
                } else {
                    self.app.app_id.clone()
                };
                let fallback = std::env::temp_dir().join(format!("{}.credentials.json", service));
                Arc::new(TokenManager::open(&service, fallback))
            }
        };
        let exchange: Arc<dyn Exchange> = match self.exchange {
            Some(e) => e,
            None => Arc::new(HttpTransport::new(&snapshot)?),
        };

        let mut chain = InterceptorChain::new()
            .with(LoggingInterceptor::new(options.clone()))
            .with(ParamsInterceptor::new(options.clone(), security.clone()))
            .with(HeaderInterceptor::new(
                options.clone(),
                tokens.clone(),
                self.app.clone(),
            ));
        for extra in self.interceptors {
            chain.push(extra);
        }
        chain.push(Arc::new(DataSecurityInterceptor::new()));

        tracing::debug!(
            interceptors = ?chain.names(),
            token_backend = tokens.backend(),
            "network client built"
        );

        Ok(NetworkClient {
            inner: Arc::new(ClientInner {
                options,
                security,
                tokens,
                chain,
                exchange,
                login_expired: self.login_expired,
            }),
        })
    }
}

impl Default for NetworkClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
