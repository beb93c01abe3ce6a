//! Envelope codec.
//!
//! Outgoing JSON bodies are signed and encrypted into a two-field request
//! envelope. Incoming bodies are decoded through the transform flags the server
//! declares on each response envelope, then deserialized into the caller's type.

mod envelope;
mod request;
mod response;

pub(crate) use envelope::deserialize_code;
pub use envelope::{Envelope, RequestEnvelope};
pub use request::{canonical_sign_input, seal_json_body};
pub use response::decode_body;
