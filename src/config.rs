//! Process-wide network options and application metadata.
//!
//! Options are built once at startup and read by every request. They can only be
//! replaced as a whole through [`OptionsCell::update_options`]; readers always see
//! one complete snapshot.

use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SUCCESS_CODE: i32 = 200;
pub const DEFAULT_LOGIN_ERROR_CODE: i32 = 401;
pub const DEFAULT_NETWORK_ERROR_CODE: i32 = -100;
pub const DEFAULT_SERVICE_ERROR_CODE: i32 = 500;
pub const DEFAULT_EMPTY_CODE: i32 = 204;
pub const DEFAULT_DECRYPT_ERROR_CODE: i32 = -9527;

/// Network options shared by every request issued through a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    pub success_code: i32,
    pub login_error_code: i32,
    pub network_error_code: i32,
    pub service_error_code: i32,
    pub empty_code: i32,
    /// Sentinel produced locally when a response payload cannot be decrypted.
    pub decrypt_error_code: i32,
    pub charset: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    /// URL-decode every enveloped `data` field, regardless of the envelope flag.
    pub need_url_decode: bool,
    /// Base64-decode every enveloped `data` field, regardless of the envelope flag.
    pub need_base64: bool,
    /// Sign and encrypt JSON POST bodies.
    pub encrypt_params: bool,
    pub media_type: String,
    pub platform: String,
    pub extra_headers: HashMap<String, String>,
    pub log_bodies: bool,
    pub log_body_limit: usize,
    pub proxy_url: Option<String>,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            success_code: DEFAULT_SUCCESS_CODE,
            login_error_code: DEFAULT_LOGIN_ERROR_CODE,
            network_error_code: DEFAULT_NETWORK_ERROR_CODE,
            service_error_code: DEFAULT_SERVICE_ERROR_CODE,
            empty_code: DEFAULT_EMPTY_CODE,
            decrypt_error_code: DEFAULT_DECRYPT_ERROR_CODE,
            charset: "UTF-8".to_string(),
            connect_timeout_secs: 15,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            need_url_decode: false,
            need_base64: false,
            encrypt_params: false,
            media_type: "application/json".to_string(),
            platform: "android".to_string(),
            extra_headers: HashMap::new(),
            log_bodies: true,
            log_body_limit: 4096,
            proxy_url: None,
        }
    }
}

impl NetworkOptions {
    /// Load options from a YAML or JSON file (JSON is valid YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let options: NetworkOptions = serde_yaml::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Apply `SECURE_RPC_*` environment overrides on top of these options.
    pub fn with_env_overrides(mut self) -> Self {
        let secs = |name: &str| env::var(name).ok().and_then(|s| s.parse::<u64>().ok());
        if let Some(v) = secs("SECURE_RPC_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = secs("SECURE_RPC_READ_TIMEOUT_SECS") {
            self.read_timeout_secs = v;
        }
        if let Some(v) = secs("SECURE_RPC_WRITE_TIMEOUT_SECS") {
            self.write_timeout_secs = v;
        }
        if let Ok(v) = env::var("SECURE_RPC_ENCRYPT_PARAMS") {
            self.encrypt_params = matches!(v.trim(), "1" | "true" | "yes");
        }
        if let Ok(v) = env::var("SECURE_RPC_PROXY_URL") {
            if !v.trim().is_empty() {
                self.proxy_url = Some(v);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new().with_field_path("connect_timeout_secs"),
            ));
        }
        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new().with_field_path("read_timeout_secs/write_timeout_secs"),
            ));
        }
        let codes = [
            ("success_code", self.success_code),
            ("login_error_code", self.login_error_code),
            ("network_error_code", self.network_error_code),
            ("service_error_code", self.service_error_code),
            ("empty_code", self.empty_code),
            ("decrypt_error_code", self.decrypt_error_code),
        ];
        if let Some((name, _)) = codes
            .iter()
            .skip(1)
            .find(|(_, code)| *code == self.success_code)
        {
            return Err(Error::configuration_with_context(
                "error code collides with the success code",
                ErrorContext::new().with_field_path(*name),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The blocking client only exposes a whole-request timeout, so the larger of
    /// the read and write budgets bounds each exchange.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(self.write_timeout_secs))
    }

    /// `Content-Type` value for JSON bodies, e.g. `application/json; charset=UTF-8`.
    pub fn content_type(&self) -> String {
        if self.charset.is_empty() || self.media_type.contains("charset") {
            self.media_type.clone()
        } else {
            format!("{}; charset={}", self.media_type, self.charset)
        }
    }
}

/// Application metadata stamped on every outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub app_id: String,
    pub version_code: String,
    pub version_name: String,
    pub channel: String,
}

impl AppInfo {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.version_code = code.into();
        self.version_name = name.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}

/// Atomically replaceable holder for [`NetworkOptions`].
pub struct OptionsCell {
    inner: ArcSwap<NetworkOptions>,
}

impl OptionsCell {
    pub fn new(options: NetworkOptions) -> Self {
        Self {
            inner: ArcSwap::from_pointee(options),
        }
    }

    /// Current snapshot. Hold the returned `Arc` for the duration of one request.
    pub fn load(&self) -> Arc<NetworkOptions> {
        self.inner.load_full()
    }

    /// Replace the whole options object.
    pub fn update_options(&self, options: NetworkOptions) -> Result<()> {
        options.validate()?;
        tracing::info!(
            encrypt_params = options.encrypt_params,
            success_code = options.success_code,
            "network options replaced"
        );
        self.inner.store(Arc::new(options));
        Ok(())
    }
}

impl Default for OptionsCell {
    fn default() -> Self {
        Self::new(NetworkOptions::default())
    }
}

static GLOBAL_OPTIONS: once_cell::sync::Lazy<Arc<OptionsCell>> =
    once_cell::sync::Lazy::new(|| Arc::new(OptionsCell::default()));

/// The process-wide options cell used by clients that were not given their own.
pub fn global() -> Arc<OptionsCell> {
    GLOBAL_OPTIONS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_error_code_table() {
        let o = NetworkOptions::default();
        assert_eq!(o.success_code, 200);
        assert_eq!(o.login_error_code, 401);
        assert_eq!(o.network_error_code, -100);
        assert_eq!(o.empty_code, 204);
        assert_eq!(o.service_error_code, 500);
        assert_eq!(o.decrypt_error_code, -9527);
        assert_eq!(o.content_type(), "application/json; charset=UTF-8");
        assert!(o.validate().is_ok());
    }

    #[test]
    fn loads_partial_yaml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "success_code: 0\nencrypt_params: true\nextra_headers:\n  X-Trace: on").unwrap();
        let o = NetworkOptions::from_file(file.path()).unwrap();
        assert_eq!(o.success_code, 0);
        assert!(o.encrypt_params);
        assert_eq!(o.extra_headers.get("X-Trace").map(String::as_str), Some("on"));
        assert_eq!(o.login_error_code, 401);
    }

    #[test]
    fn rejects_code_colliding_with_success() {
        let o = NetworkOptions {
            empty_code: 200,
            ..Default::default()
        };
        let err = o.validate().unwrap_err();
        assert!(err.to_string().contains("empty_code"));
    }

    #[test]
    fn update_replaces_whole_snapshot() {
        let cell = OptionsCell::default();
        let before = cell.load();
        cell.update_options(NetworkOptions {
            need_base64: true,
            ..Default::default()
        })
        .unwrap();
        assert!(!before.need_base64);
        assert!(cell.load().need_base64);
    }

    #[test]
    fn invalid_update_keeps_previous_snapshot() {
        let cell = OptionsCell::default();
        let bad = NetworkOptions {
            read_timeout_secs: 0,
            ..Default::default()
        };
        assert!(cell.update_options(bad).is_err());
        assert_eq!(cell.load().read_timeout_secs, 30);
    }
}
