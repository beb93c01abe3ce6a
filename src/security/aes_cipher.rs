//! AES-256-GCM backend for the session and anonymous schemes.

use crate::{Error, ErrorContext, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Wire layout: `base64(nonce || ciphertext || tag)`.
pub(crate) struct AesCipher {
    cipher: Aes256Gcm,
}

impl AesCipher {
    /// The 256-bit key is the SHA-256 digest of the shared secret string.
    pub(crate) fn from_secret(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    pub(crate) fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| {
                Error::crypto_with_context("AES encryption failed", ErrorContext::new().with_source("aes"))
            })?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(base64::engine::general_purpose::STANDARD.encode(out))
    }

    pub(crate) fn decrypt(&self, ciphertext: &str) -> Option<String> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(ciphertext.trim())
            .ok()?;
        if raw.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self.cipher.decrypt(Nonce::from_slice(nonce), sealed).ok()?;
        String::from_utf8(plain).ok()
    }
}
