//! Call result adapter: the single boundary where every outcome becomes an
//! [`ApiResult`].

use super::core::NetworkClient;
use super::result::ApiResult;
use crate::codec::decode_body;
use crate::config::NetworkOptions;
use crate::transport::{HttpRequest, HttpResponse, TransportError};
use crate::Error;
use serde::de::DeserializeOwned;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;
use url::Url;

pub const MSG_TIMEOUT: &str = "Network timeout";
pub const MSG_UNREACHABLE: &str = "Network unreachable";
pub const MSG_IO: &str = "IO Exception";
pub const MSG_EMPTY: &str = "Empty response";
pub const MSG_LOGIN_EXPIRED: &str = "Login expired";

/// Passed to the login-expired hook whenever a call yields the login-error code.
#[derive(Debug, Clone)]
pub struct LoginExpired {
    pub code: i32,
    pub msg: Option<String>,
    pub url: Url,
}

pub type LoginExpiredHook = std::sync::Arc<dyn Fn(&LoginExpired) + Send + Sync>;

/// Run one call synchronously and normalize the outcome. Never panics or errors.
pub(crate) fn execute<T: DeserializeOwned>(
    client: &NetworkClient,
    request: Result<HttpRequest, Error>,
) -> ApiResult<T> {
    let options = client.options();
    let request = match request {
        Ok(r) => r,
        Err(e) => {
            return ApiResult::failure(options.service_error_code, e.to_string())
                .with_success_code(options.success_code)
        }
    };
    let url = request.url.clone();

    let outcome = catch_unwind(AssertUnwindSafe(|| match client.dispatch(request) {
        Ok(resp) => from_response::<T>(client, resp, &options),
        Err(e) => from_transport_error(&e, &options),
    }));
    let result = match outcome {
        Ok(r) => r,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "call panicked".to_string());
            warn!(url = %url, error = %msg, "call panicked");
            ApiResult::failure(options.service_error_code, msg)
        }
    }
    .with_success_code(options.success_code);

    if result.code == options.login_error_code {
        if let Some(hook) = client.login_expired_hook() {
            let event = LoginExpired {
                code: result.code,
                msg: result.msg.clone(),
                url,
            };
            let _ = catch_unwind(AssertUnwindSafe(|| hook(&event)));
        }
    }
    result
}

fn from_response<T: DeserializeOwned>(
    client: &NetworkClient,
    resp: HttpResponse,
    options: &NetworkOptions,
) -> ApiResult<T> {
    if !resp.is_success() {
        return ApiResult::failure(resp.status.as_u16() as i32, resp.message());
    }
    if resp.body_is_blank() {
        return ApiResult::failure(options.empty_code, MSG_EMPTY);
    }

    match decode_body::<ApiResult<T>>(&resp.body, client.security(), options) {
        Ok(mut result) => {
            if result.code == options.login_error_code && result.msg.is_none() {
                result.msg = Some(MSG_LOGIN_EXPIRED.to_string());
            }
            result
        }
        Err(e) => {
            warn!(error = %e, "failed to decode response body");
            ApiResult::failure(options.service_error_code, e.to_string())
        }
    }
}

pub(crate) fn from_transport_error<T>(e: &TransportError, options: &NetworkOptions) -> ApiResult<T> {
    match e {
        TransportError::Timeout(_) => ApiResult::failure(options.network_error_code, MSG_TIMEOUT),
        TransportError::Connect(_) => {
            ApiResult::failure(options.network_error_code, MSG_UNREACHABLE)
        }
        TransportError::Io(_) => ApiResult::failure(options.network_error_code, MSG_IO),
        TransportError::Build(_) | TransportError::Other(_) => {
            ApiResult::failure(options.service_error_code, e.to_string())
        }
    }
}
