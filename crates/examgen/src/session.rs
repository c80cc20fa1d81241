//! Bearer-token session state.

use std::sync::Arc;

use crate::storage::{KeyValueStore, KEY_ACCESS_TOKEN};

/// Holds the optional bearer token for the current session.
///
/// The durable store is the single source of truth, read on every `token()`
/// call so a token updated by another instance sharing the same profile is
/// never served stale. Constructed once per process and passed by `Arc` to
/// every component that talks to the backend.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the current bearer token, if any. Absence is valid: anonymous
    /// flows run without one.
    pub fn token(&self) -> Option<String> {
        self.store.get(KEY_ACCESS_TOKEN)
    }

    /// Sets or clears the token. Written on login/refresh (`Some`) and on
    /// logout or a 401 (`None`).
    pub fn set_token(&self, token: Option<&str>) {
        let result = match token {
            Some(value) => self.store.set(KEY_ACCESS_TOKEN, value),
            None => self.store.remove(KEY_ACCESS_TOKEN),
        };
        if let Err(e) = result {
            log::error!("Failed to persist session token: {}", e);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_token_roundtrip() {
        let session = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(!session.is_authenticated());

        session.set_token(Some("tok-1"));
        assert_eq!(session.token().as_deref(), Some("tok-1"));

        session.set_token(None);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_token_read_fresh_from_store() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionStore::new(store.clone() as Arc<dyn KeyValueStore>);

        // Another instance sharing the profile writes a new token.
        store.set(KEY_ACCESS_TOKEN, "external").unwrap();
        assert_eq!(session.token().as_deref(), Some("external"));
    }
}
