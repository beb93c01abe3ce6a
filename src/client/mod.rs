//! Transport client and call result adapter.

mod adapter;
mod builder;
mod call;
mod core;
mod result;

pub use adapter::{
    LoginExpired, LoginExpiredHook, MSG_EMPTY, MSG_IO, MSG_LOGIN_EXPIRED, MSG_TIMEOUT,
    MSG_UNREACHABLE,
};
pub use builder::NetworkClientBuilder;
pub use call::{Call, RequestBuilder};
pub use self::core::{Endpoint, NetworkClient, Service};
pub use result::ApiResult;
