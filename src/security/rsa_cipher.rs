//! RSA (PKCS#1 v1.5) backend with block-wise encryption.

use crate::{Error, ErrorContext, Result};
use base64::Engine as _;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

// PKCS#1 v1.5 padding overhead per block.
const PADDING_OVERHEAD: usize = 11;

pub(crate) struct RsaCipher {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaCipher {
    /// Accepts PEM, or base64 DER, holding either a PKCS#8 private key or an SPKI public key.
    /// Only a private key enables local decryption.
    pub(crate) fn from_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let private = if secret.starts_with("-----BEGIN") {
            if secret.contains("PRIVATE KEY") {
                Some(RsaPrivateKey::from_pkcs8_pem(secret).map_err(|e| key_error(e.to_string()))?)
            } else {
                let public =
                    RsaPublicKey::from_public_key_pem(secret).map_err(|e| key_error(e.to_string()))?;
                return Ok(Self {
                    public,
                    private: None,
                });
            }
        } else {
            let compact: String = secret.split_whitespace().collect();
            let der = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| key_error(e.to_string()))?;
            match RsaPrivateKey::from_pkcs8_der(&der) {
                Ok(key) => Some(key),
                Err(_) => {
                    let public = RsaPublicKey::from_public_key_der(&der)
                        .map_err(|e| key_error(e.to_string()))?;
                    return Ok(Self {
                        public,
                        private: None,
                    });
                }
            }
        };

        match private {
            Some(key) => Ok(Self {
                public: key.to_public_key(),
                private: Some(key),
            }),
            None => Err(key_error("no key material".to_string())),
        }
    }

    pub(crate) fn encrypt(&self, plaintext: &str) -> Result<String> {
        let block = self.public.size().saturating_sub(PADDING_OVERHEAD);
        if block == 0 {
            return Err(key_error("modulus too small".to_string()));
        }
        let bytes = plaintext.as_bytes();
        let mut rng = rand::thread_rng();
        let mut out = Vec::new();
        let chunks: Vec<&[u8]> = if bytes.is_empty() {
            vec![bytes]
        } else {
            bytes.chunks(block).collect()
        };
        for chunk in chunks {
            let sealed = self
                .public
                .encrypt(&mut rng, Pkcs1v15Encrypt, chunk)
                .map_err(|e| {
                    Error::crypto_with_context(
                        "RSA encryption failed",
                        ErrorContext::new().with_details(e.to_string()).with_source("rsa"),
                    )
                })?;
            out.extend_from_slice(&sealed);
        }
        Ok(base64::engine::general_purpose::STANDARD.encode(out))
    }

    pub(crate) fn decrypt(&self, ciphertext: &str) -> Option<String> {
        let private = self.private.as_ref()?;
        let raw = base64::engine::general_purpose::STANDARD
            .decode(ciphertext.trim())
            .ok()?;
        let block = private.size();
        if raw.is_empty() || raw.len() % block != 0 {
            return None;
        }
        let mut plain = Vec::with_capacity(raw.len());
        for chunk in raw.chunks(block) {
            plain.extend(private.decrypt(Pkcs1v15Encrypt, chunk).ok()?);
        }
        String::from_utf8(plain).ok()
    }
}

fn key_error(details: String) -> Error {
    Error::crypto_with_context(
        "invalid RSA key material",
        ErrorContext::new().with_details(details).with_source("rsa"),
    )
}
