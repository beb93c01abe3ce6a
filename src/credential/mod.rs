//! Credential store: the current bearer token, cached in memory and mirrored to
//! at-rest storage.

mod store;
mod token;

pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
pub use token::{TokenManager, TOKEN_KEY};
