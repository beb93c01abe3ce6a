use super::envelope::RequestEnvelope;
use crate::security::CryptoContext;
use crate::{Error, ErrorContext, Result};
use serde_json::{Map, Value};

/// Flatten top-level keys, sorted, into `key + value` pairs.
///
/// String values contribute their raw text; anything else its compact JSON form.
pub fn canonical_sign_input(object: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    let mut out = String::new();
    for key in keys {
        out.push_str(key);
        match &object[key.as_str()] {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

/// Sign and encrypt a JSON object body into `{"data": .., "signData": ..}`.
///
/// Signing and encryption use the same context snapshot. AES-family ciphertext
/// is URL-encoded for transmission.
pub fn seal_json_body(raw: &[u8], ctx: &CryptoContext) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        Error::codec_with_context(
            "request body is not UTF-8",
            ErrorContext::new().with_details(e.to_string()).with_source("params"),
        )
    })?;
    let value: Value = serde_json::from_str(text)?;
    let object = value.as_object().ok_or_else(|| {
        Error::codec_with_context(
            "request body is not a JSON object",
            ErrorContext::new().with_source("params"),
        )
    })?;

    let sign_data = ctx.sign(&canonical_sign_input(object)).ok_or_else(|| {
        Error::crypto_with_context("signing failed", ErrorContext::new().with_source("params"))
    })?;
    let mut data = ctx.encrypt(text)?;
    if ctx.scheme().is_symmetric() {
        data = url::form_urlencoded::byte_serialize(data.as_bytes()).collect();
    }

    Ok(serde_json::to_vec(&RequestEnvelope { data, sign_data })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::CryptoScheme;
    use serde_json::json;

    #[test]
    fn sign_input_sorts_keys_and_flattens_values() {
        let body = json!({"b": "two", "a": 1, "c": {"x": true}, "d": null});
        let input = canonical_sign_input(body.as_object().unwrap());
        assert_eq!(input, "a1btwoc{\"x\":true}dnull");
    }

    #[test]
    fn sealed_body_decrypts_back_to_original() {
        let ctx = CryptoContext::new(CryptoScheme::Aes, "session").unwrap();
        let raw = br#"{"user":"alice","page":2}"#;
        let sealed = seal_json_body(raw, &ctx).unwrap();
        let env: RequestEnvelope = serde_json::from_slice(&sealed).unwrap();

        assert_eq!(env.sign_data, ctx.sign("page2useralice").unwrap());
        let cipher = percent_encoding::percent_decode_str(&env.data.replace('+', " "))
            .decode_utf8()
            .unwrap()
            .into_owned();
        assert_eq!(ctx.decrypt(&cipher).as_deref(), Some(r#"{"user":"alice","page":2}"#));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let ctx = CryptoContext::new(CryptoScheme::Aes, "session").unwrap();
        assert!(seal_json_body(b"[1,2]", &ctx).is_err());
        assert!(seal_json_body(b"not json", &ctx).is_err());
    }
}
