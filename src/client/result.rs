use crate::codec::deserialize_code;
use crate::config::DEFAULT_SUCCESS_CODE;
use serde::{Deserialize, Serialize};

fn default_success_code() -> i32 {
    DEFAULT_SUCCESS_CODE
}

/// Caller-facing outcome of a network call.
///
/// Every exit path of a call produces one of these: server success or business
/// error, empty body, HTTP error, transport failure, or local decode failure.
/// Inspect [`code`](Self::code) or [`is_success`](Self::is_success); nothing is
/// thrown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult<T> {
    #[serde(deserialize_with = "deserialize_code")]
    pub code: i32,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub state: bool,
    #[serde(skip, default = "default_success_code")]
    success_code: i32,
}

impl<T> ApiResult<T> {
    pub fn new(code: i32, msg: Option<String>, data: Option<T>) -> Self {
        Self {
            code,
            msg,
            data,
            state: false,
            success_code: DEFAULT_SUCCESS_CODE,
        }
    }

    pub fn failure(code: i32, msg: impl Into<String>) -> Self {
        Self::new(code, Some(msg.into()), None)
    }

    /// `true` iff `code` equals the success code configured when the result was produced.
    pub fn is_success(&self) -> bool {
        self.code == self.success_code
    }

    pub fn success_code(&self) -> i32 {
        self.success_code
    }

    pub(crate) fn with_success_code(mut self, code: i32) -> Self {
        self.success_code = code;
        self
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            code: self.code,
            msg: self.msg,
            data: self.data.map(f),
            state: self.state,
            success_code: self.success_code,
        }
    }
}
