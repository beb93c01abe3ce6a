//! # secure-rpc
//!
//! Secure request pipeline for app-to-backend JSON APIs.
//!
//! ## Overview
//!
//! Every call passes through a fixed interceptor chain before it reaches the
//! shared HTTP client: request logging, parameter sealing (sign then encrypt),
//! header injection and a response hook. Responses arrive as envelopes whose
//! `data` may be URL-encoded, encrypted or base64-encoded; the codec reverses
//! those transforms according to the flags the server sets, and the call adapter
//! turns every outcome, including transport failures, into an [`ApiResult`].
//!
//! ## Key Features
//!
//! - **Swappable crypto**: [`SecurityManager`] holds one active scheme (RSA,
//!   AES or anonymous AES) and can be re-keyed at runtime without locking callers
//! - **Fail-open sealing**: a body that cannot be sealed is sent as-is
//! - **Never throws**: calls return a result envelope for timeouts, refused
//!   connections, HTTP errors and empty bodies alike
//! - **Token storage**: [`TokenManager`] persists the session token in the OS
//!   keyring, falling back to a file store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use secure_rpc::{ApiResult, CryptoScheme, NetworkClient, NetworkOptions};
//!
//! fn main() -> secure_rpc::Result<()> {
//!     let client = NetworkClient::builder()
//!         .options(NetworkOptions {
//!             encrypt_params: true,
//!             ..Default::default()
//!         })
//!         .build()?;
//!     client.security().reset_secret(CryptoScheme::Aes, "session-secret")?;
//!
//!     let api = client.endpoint("https://api.example.com/v1/")?;
//!     let result: ApiResult<serde_json::Value> = api
//!         .post("user/login")
//!         .json(&serde_json::json!({"name": "alice"}))
//!         .execute();
//!     if result.is_success() {
//!         println!("{:?}", result.data());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, endpoints and the call adapter |
//! | [`codec`] | Request and response envelope codec |
//! | [`config`] | Network options, app metadata and the shared options cell |
//! | [`credential`] | Token persistence |
//! | [`interceptors`] | Interceptor trait and the built-in stages |
//! | [`security`] | Crypto schemes, signing and the security manager |
//! | [`transport`] | HTTP request/response model and the blocking exchange |

pub mod client;
pub mod codec;
pub mod config;
pub mod credential;
pub mod interceptors;
pub mod security;
pub mod transport;

// Re-export main types for convenience
pub use client::{ApiResult, Call, Endpoint, NetworkClient, NetworkClientBuilder, RequestBuilder, Service};
pub use codec::Envelope;
pub use config::{AppInfo, NetworkOptions};
pub use credential::TokenManager;
pub use security::{CryptoScheme, SecurityManager};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

// Re-export error types
pub mod error;
pub use error::{Error, ErrorContext};
