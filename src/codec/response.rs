use super::envelope::{read_code, EnvelopeFlags};
use crate::config::NetworkOptions;
use crate::security::SecurityManager;
use crate::{Error, ErrorContext, Result};
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Decode a raw response body into `R`, applying the envelope transform flags.
///
/// Bodies that are not JSON objects, or objects without a readable `code` or a
/// non-null `data`, are deserialized as-is. A payload that fails to decrypt turns
/// the envelope into a `decrypt_error_code` envelope without `data` instead of
/// failing.
pub fn decode_body<R: DeserializeOwned>(
    body: &[u8],
    security: &SecurityManager,
    options: &NetworkOptions,
) -> Result<R> {
    let value: Value = serde_json::from_slice(body)?;
    let mut map = match value {
        Value::Object(map) => map,
        other => return Ok(serde_json::from_value(other)?),
    };
    normalize_message(&mut map);

    let Some(code) = read_code(&map) else {
        return finish(map);
    };
    let raw = match map.get("data") {
        None | Some(Value::Null) => return finish(map),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let flags = EnvelopeFlags::read(&map);
    debug!(
        code,
        state = ?map.get("state"),
        tag = ?map.get("tag"),
        encryption = flags.encryption,
        base64 = flags.base64,
        url_encoder = flags.url_encoder,
        "decoding response envelope"
    );

    let mut text = raw;
    if flags.url_encoder || options.need_url_decode {
        text = url_decode(&text);
    }
    if flags.encryption {
        match security.decrypt(&text) {
            Some(plain) => text = plain,
            None => {
                warn!(code, "response payload could not be decrypted");
                map.insert("code".into(), Value::from(options.decrypt_error_code));
                map.remove("data");
                // One spelling only; `message` is an alias of `msg` downstream.
                if let Some(message) = map.remove("message") {
                    map.entry("msg").or_insert(message);
                }
                map.entry("msg")
                    .or_insert_with(|| Value::String("Decrypt failed".into()));
                return finish(map);
            }
        }
    } else if flags.base64 || options.need_base64 {
        text = base64_decode(&text)?;
    }

    let data = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    map.insert("data".into(), data);
    finish(map)
}

fn finish<R: DeserializeOwned>(map: Map<String, Value>) -> Result<R> {
    Ok(serde_json::from_value(Value::Object(map))?)
}

// `msg` wins when a body carries both spellings.
fn normalize_message(map: &mut Map<String, Value>) {
    if map.contains_key("msg") {
        map.remove("message");
    }
}

/// Form-style URL decoding: `+` is a space, `%XX` an escaped byte.
fn url_decode(text: &str) -> String {
    let spaced = text.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .into_owned()
}

fn base64_decode(text: &str) -> Result<String> {
    let compact: String = text.split_whitespace().collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| {
            Error::codec_with_context(
                "data is not valid base64",
                ErrorContext::new()
                    .with_field_path("data")
                    .with_details(e.to_string())
                    .with_source("envelope_codec"),
            )
        })?;
    String::from_utf8(bytes).map_err(|e| {
        Error::codec_with_context(
            "decoded data is not UTF-8",
            ErrorContext::new()
                .with_field_path("data")
                .with_details(e.to_string())
                .with_source("envelope_codec"),
        )
    })
}
