use super::store::{FileStore, KeyValueStore, KeyringStore};
use arc_swap::ArcSwapOption;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const TOKEN_KEY: &str = "token";

/// Current bearer token.
///
/// Reads and writes are last-write-wins. The in-memory value is authoritative as
/// soon as it is set; persistence is best-effort.
pub struct TokenManager {
    cached: ArcSwapOption<String>,
    store: Box<dyn KeyValueStore>,
}

impl TokenManager {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            cached: ArcSwapOption::empty(),
            store,
        }
    }

    /// Prefer platform secure storage; fall back to an unencrypted file at
    /// `fallback_path` if it cannot be initialized.
    pub fn open(service: &str, fallback_path: impl Into<PathBuf>) -> Self {
        match KeyringStore::open(service) {
            Ok(store) => Self::new(Box::new(store)),
            Err(e) => {
                let store = FileStore::new(fallback_path);
                warn!(error = %e, path = %store.path().display(), "secure storage unavailable, using plain file store");
                Self::new(Box::new(store))
            }
        }
    }

    /// Name of the active storage backend.
    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn token(&self) -> Option<String> {
        if let Some(t) = self.cached.load_full() {
            if !t.trim().is_empty() {
                return Some(t.as_ref().clone());
            }
        }
        match self.store.get(TOKEN_KEY) {
            Ok(Some(t)) if !t.trim().is_empty() => {
                self.cached.store(Some(Arc::new(t.clone())));
                Some(t)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "failed to read persisted token");
                None
            }
        }
    }

    pub fn reset_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.cached.store(Some(Arc::new(token.clone())));
        if let Err(e) = self.store.put(TOKEN_KEY, &token) {
            warn!(error = %e, backend = self.backend(), "failed to persist token");
        }
        info!(backend = self.backend(), "token reset");
    }

    /// Remove the persisted token. The in-memory value stays until the next
    /// explicit reset.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!(error = %e, backend = self.backend(), "failed to remove persisted token");
        }
    }
}
