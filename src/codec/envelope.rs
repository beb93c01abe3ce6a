use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Response envelope as it appears on the wire.
///
/// `data` is opaque until the transform flags have been applied: url-decode
/// first, then either decrypt or base64-decode, never both. `state` is carried
/// as metadata only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Envelope {
    #[serde(deserialize_with = "deserialize_code")]
    pub code: i32,
    #[serde(alias = "message", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub state: bool,
    pub data: Value,
    pub encryption: bool,
    pub base64: bool,
    pub url_encoder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<String>,
}

impl Envelope {
    pub fn new(code: i32, data: Value) -> Self {
        Self {
            code,
            data,
            ..Default::default()
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }
}

/// Body sent in place of the plaintext JSON when parameters are encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub data: String,
    #[serde(rename = "signData")]
    pub sign_data: String,
}

/// Transform flags read leniently from a raw envelope object.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EnvelopeFlags {
    pub encryption: bool,
    pub base64: bool,
    pub url_encoder: bool,
}

impl EnvelopeFlags {
    pub(crate) fn read(map: &Map<String, Value>) -> Self {
        Self {
            encryption: flag(map, "encryption"),
            base64: flag(map, "base64"),
            url_encoder: flag(map, "urlEncoder"),
        }
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}

/// Envelope `code` as an integer, accepting numeric strings.
pub(crate) fn read_code(map: &Map<String, Value>) -> Option<i64> {
    match map.get("code")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Deserialize a `code` field that may arrive as a number or a numeric string,
/// matching what [`read_code`] accepts.
pub(crate) fn deserialize_code<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(i32),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(code) => Ok(code),
        Code::Text(text) => text
            .trim()
            .parse::<i32>()
            .map_err(|_| serde::de::Error::custom(format!("invalid code '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_are_exact() {
        let env = Envelope {
            url_encoder: true,
            tag: Some("t".into()),
            ..Envelope::new(200, json!("x")).with_msg("ok")
        };
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["urlEncoder"], json!(true));
        assert_eq!(v["msg"], json!("ok"));
        assert!(v.get("extended").is_none());

        let req = RequestEnvelope {
            data: "c".into(),
            sign_data: "s".into(),
        };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({"data": "c", "signData": "s"})
        );
    }

    #[test]
    fn message_alias_is_accepted() {
        let env: Envelope = serde_json::from_value(json!({"code": 1, "message": "m"})).unwrap();
        assert_eq!(env.msg.as_deref(), Some("m"));
    }

    #[test]
    fn string_code_matches_lenient_reader() {
        let raw = json!({"code": "200", "data": "x"});
        let env: Envelope = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(Some(env.code as i64), read_code(raw.as_object().unwrap()));
    }

    #[test]
    fn lenient_flags_and_code() {
        let map = json!({"code": "401", "encryption": "true", "base64": 1, "urlEncoder": null});
        let map = map.as_object().unwrap();
        let flags = EnvelopeFlags::read(map);
        assert!(flags.encryption && flags.base64 && !flags.url_encoder);
        assert_eq!(read_code(map), Some(401));
        assert_eq!(read_code(json!({"code": []}).as_object().unwrap()), None);
    }
}
