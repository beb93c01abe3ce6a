//! Pluggable payload crypto with runtime-swappable key material.
//!
//! The active `(scheme, secret)` pair lives in a [`CryptoContext`] that is never
//! mutated; [`SecurityManager::reset_secret`] builds a new context and swaps the
//! pointer. Readers always observe one complete pair.
//!
//! Requests that straddle a swap may still disagree with the server: a body
//! encrypted under the old pair can arrive after the server switched, and a
//! response may be sealed under a pair the client has already replaced. Pinning
//! a key epoch per request would need a protocol change.

mod aes_cipher;
mod rsa_cipher;
mod sign;

use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwapOption;
use base64::Engine as _;
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use self::aes_cipher::AesCipher;
use self::rsa_cipher::RsaCipher;

/// Supported crypto schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptoScheme {
    /// Asymmetric; request payloads are sealed with the server's public key.
    Rsa,
    /// Symmetric with a per-session key issued after login.
    Aes,
    /// Symmetric with a locally generated key, used before login.
    AnonymousAes,
}

impl CryptoScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Aes => "aes",
            Self::AnonymousAes => "anonymous_aes",
        }
    }

    /// AES-family ciphertext is URL-encoded when placed in a request body.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Aes | Self::AnonymousAes)
    }
}

impl fmt::Display for CryptoScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsa" => Ok(Self::Rsa),
            "aes" => Ok(Self::Aes),
            "anonymous_aes" | "no_login_aes" | "anonymous-aes" => Ok(Self::AnonymousAes),
            other => Err(Error::configuration_with_context(
                format!("unknown crypto scheme '{}'", other),
                ErrorContext::new()
                    .with_field_path("scheme")
                    .with_source("security_manager"),
            )),
        }
    }
}

enum Backend {
    Aes(AesCipher),
    Rsa(RsaCipher),
}

/// One immutable `(scheme, secret)` pair with its prepared cipher.
pub struct CryptoContext {
    scheme: CryptoScheme,
    secret: String,
    backend: Backend,
}

impl CryptoContext {
    pub fn new(scheme: CryptoScheme, secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(Error::crypto_with_context(
                "secret must not be empty",
                ErrorContext::new().with_source("security_manager"),
            ));
        }
        let backend = match scheme {
            CryptoScheme::Aes | CryptoScheme::AnonymousAes => {
                Backend::Aes(AesCipher::from_secret(&secret))
            }
            CryptoScheme::Rsa => Backend::Rsa(RsaCipher::from_secret(&secret)?),
        };
        Ok(Self {
            scheme,
            secret,
            backend,
        })
    }

    pub fn scheme(&self) -> CryptoScheme {
        self.scheme
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        match &self.backend {
            Backend::Aes(c) => c.encrypt(plaintext),
            Backend::Rsa(c) => c.encrypt(plaintext),
        }
    }

    pub fn decrypt(&self, ciphertext: &str) -> Option<String> {
        match &self.backend {
            Backend::Aes(c) => c.decrypt(ciphertext),
            Backend::Rsa(c) => c.decrypt(ciphertext),
        }
    }

    pub fn sign(&self, data: &str) -> Option<String> {
        sign::hmac_sha256_hex(&self.secret, data)
    }
}

impl fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoContext")
            .field("scheme", &self.scheme)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Shared crypto provider. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct SecurityManager {
    context: ArcSwapOption<CryptoContext>,
}

impl SecurityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active pair in a single pointer swap.
    pub fn reset_secret(&self, scheme: CryptoScheme, secret: impl Into<String>) -> Result<()> {
        let ctx = CryptoContext::new(scheme, secret)?;
        self.context.store(Some(Arc::new(ctx)));
        tracing::info!(scheme = %scheme, "crypto context replaced");
        Ok(())
    }

    /// Like [`reset_secret`](Self::reset_secret) with a scheme name; unknown names are
    /// a configuration error.
    pub fn reset_secret_named(&self, scheme: &str, secret: impl Into<String>) -> Result<()> {
        let scheme = scheme.parse::<CryptoScheme>()?;
        self.reset_secret(scheme, secret)
    }

    /// Install a fresh random key under [`CryptoScheme::AnonymousAes`] and return it
    /// (base64) so it can be handed to the server.
    pub fn generate_anonymous_secret(&self) -> Result<String> {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        let secret = base64::engine::general_purpose::STANDARD.encode(key);
        self.reset_secret(CryptoScheme::AnonymousAes, secret.clone())?;
        Ok(secret)
    }

    pub fn clear_secret(&self) {
        self.context.store(None);
        tracing::info!("crypto context cleared");
    }

    /// The current pair. Use one snapshot for every step of a single request.
    pub fn snapshot(&self) -> Option<Arc<CryptoContext>> {
        self.context.load_full()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        match self.snapshot() {
            Some(ctx) => ctx.encrypt(plaintext),
            None => Err(no_secret()),
        }
    }

    pub fn decrypt(&self, ciphertext: &str) -> Option<String> {
        self.snapshot()?.decrypt(ciphertext)
    }

    pub fn sign(&self, data: &str) -> Option<String> {
        self.snapshot()?.sign(data)
    }
}

pub(crate) fn no_secret() -> Error {
    Error::crypto_with_context(
        "no secret configured",
        ErrorContext::new().with_source("security_manager"),
    )
}
