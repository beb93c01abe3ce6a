//! Ordered request/response interceptors.
//!
//! The client installs a fixed pipeline, outermost first:
//! logging, params (sign + encrypt), headers, any user interceptors, and a
//! terminal data-security stage. Each stage receives the request and a [`Next`]
//! handle that runs the rest of the chain and finally the exchange.

mod data_security;
mod header;
mod logging;
mod params;

pub use data_security::DataSecurityInterceptor;
pub use header::HeaderInterceptor;
pub use logging::LoggingInterceptor;
pub use params::ParamsInterceptor;

use crate::transport::{Exchange, HttpRequest, HttpResponse, TransportError};
use std::sync::Arc;

/// One stage of the pipeline.
pub trait Interceptor: Send + Sync {
    fn intercept(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError>;

    fn name(&self) -> &str {
        "unnamed"
    }
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Interceptor>],
    exchange: &'a dyn Exchange,
}

impl<'a> Next<'a> {
    pub fn proceed(self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.rest.split_first() {
            Some((head, tail)) => head.intercept(
                request,
                Next {
                    rest: tail,
                    exchange: self.exchange,
                },
            ),
            None => self.exchange.exchange(request),
        }
    }
}

/// A simple interceptor pipeline that runs stages in order.
pub struct InterceptorChain {
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn execute(
        &self,
        request: HttpRequest,
        exchange: &dyn Exchange,
    ) -> Result<HttpResponse, TransportError> {
        Next {
            rest: &self.interceptors,
            exchange,
        }
        .proceed(request)
    }
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use reqwest::{Method, StatusCode};
    use std::sync::Mutex;

    /// Exchange that records the last request and replies with a fixed response.
    pub(crate) struct RecordingExchange {
        pub(crate) seen: Mutex<Option<HttpRequest>>,
        pub(crate) reply: HttpResponse,
    }

    impl RecordingExchange {
        pub(crate) fn new(reply: HttpResponse) -> Self {
            Self {
                seen: Mutex::new(None),
                reply,
            }
        }

        pub(crate) fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().clone().expect("no request recorded")
        }
    }

    impl Exchange for RecordingExchange {
        fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(self.reply.clone())
        }
    }

    struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>);

    impl Interceptor for Tag {
        fn intercept(
            &self,
            mut request: HttpRequest,
            next: Next<'_>,
        ) -> Result<HttpResponse, TransportError> {
            self.1.lock().unwrap().push(self.0);
            request
                .headers
                .append("x-order", HeaderValue::from_static(self.0));
            next.proceed(request)
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn stages_run_in_insertion_order_then_exchange() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::new()
            .with(Tag("first", order.clone()))
            .with(Tag("second", order.clone()));
        let exchange = RecordingExchange::new(HttpResponse::new(StatusCode::OK, "{}"));
        let req = HttpRequest::new(Method::GET, url::Url::parse("http://h/").unwrap());

        let resp = chain.execute(req, &exchange).unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(chain.names(), vec!["first", "second"]);

        let seen = exchange.last();
        let tags: Vec<_> = seen.headers.get_all("x-order").iter().collect();
        assert_eq!(tags, vec!["first", "second"]);
    }

    #[test]
    fn empty_chain_goes_straight_to_exchange() {
        let chain = InterceptorChain::default();
        assert!(chain.is_empty());
        let exchange = RecordingExchange::new(HttpResponse::new(StatusCode::ACCEPTED, ""));
        let req = HttpRequest::new(Method::GET, url::Url::parse("http://h/x").unwrap());
        let resp = chain.execute(req, &exchange).unwrap();
        assert_eq!(resp.status, StatusCode::ACCEPTED);
        assert_eq!(exchange.last().url.path(), "/x");
    }
}
