use super::{Interceptor, Next};
use crate::transport::{HttpRequest, HttpResponse, TransportError};

/// Terminal stage reserved for request-side data-security hooks. Currently a
/// pass-through.
#[derive(Debug, Default)]
pub struct DataSecurityInterceptor;

impl DataSecurityInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for DataSecurityInterceptor {
    fn intercept(
        &self,
        request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, TransportError> {
        next.proceed(request)
    }

    fn name(&self) -> &str {
        "data_security"
    }
}
