use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `data` keyed by `secret`, lowercase hex.
pub(crate) fn hmac_sha256_hex(secret: &str, data: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(data.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        let sig = hmac_sha256_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn deterministic_under_fixed_key() {
        let a = hmac_sha256_hex("k", "a1b2").unwrap();
        let b = hmac_sha256_hex("k", "a1b2").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, hmac_sha256_hex("k2", "a1b2").unwrap());
    }
}
