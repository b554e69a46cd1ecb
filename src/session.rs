//! Shared client session
//!
//! One `ClientContext` is created after startup and handed to every
//! workflow. It replaces the module-level globals of the original client
//! (`AppState`, the uploaded-filename set) with an explicit object that has
//! a defined login/logout lifecycle.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::UserRef;
use crate::storage::KeyValueStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Key under which the serialized session lives in the key-value store
pub const SESSION_STORE_KEY: &str = "wardrobe_session";

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<UserRef>,
    /// Advisory busy flag. UI affordances should disable wardrobe-mutating
    /// actions while set; nothing at the data layer enforces it.
    pub loading: bool,
}

/// Shared handle on the mutable session
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<UserRef> {
        self.inner.lock().unwrap().user.clone()
    }

    /// The identity check every identity-requiring call performs before
    /// any network I/O
    pub fn require_user(&self) -> Result<UserRef, ClientError> {
        self.current_user().ok_or(ClientError::Unauthenticated)
    }

    pub fn set_user(&self, user: UserRef) {
        self.inner.lock().unwrap().user = Some(user);
    }

    pub fn clear_user(&self) {
        self.inner.lock().unwrap().user = None;
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().unwrap().loading
    }

    /// Raises the loading flag until the returned guard is dropped, so the
    /// flag is restored on every exit path of an operation
    pub fn begin_loading(&self) -> LoadingGuard {
        self.inner.lock().unwrap().loading = true;
        LoadingGuard {
            state: self.clone(),
        }
    }
}

/// Clears the loading flag on drop
pub struct LoadingGuard {
    state: SessionState,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state.inner.lock().unwrap().loading = false;
    }
}

/// Filenames confirmed uploaded during this session
///
/// Purely a heuristic to warn on re-selecting the same filename; content
/// duplicates are detected server-side by hash.
#[derive(Clone, Default)]
pub struct UploadedNames {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl UploadedNames {
    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().unwrap().contains(name)
    }

    pub fn insert(&self, name: &str) {
        self.inner.lock().unwrap().insert(name.to_string());
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the workflows share: configuration, session, dedupe set and
/// the persistent store
#[derive(Clone)]
pub struct ClientContext {
    pub config: ClientConfig,
    pub session: SessionState,
    pub uploaded: UploadedNames,
    store: Arc<dyn KeyValueStore>,
}

impl ClientContext {
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            session: SessionState::new(),
            uploaded: UploadedNames::default(),
            store,
        }
    }

    /// Restores a persisted session, if any. A corrupt entry is dropped.
    pub fn restore_session(&self) -> Option<UserRef> {
        let raw = self.store.get(SESSION_STORE_KEY)?;
        match serde_json::from_str::<UserRef>(&raw) {
            Ok(user) => {
                log::info!("Restored session for {}", user.username);
                self.session.set_user(user.clone());
                Some(user)
            }
            Err(e) => {
                log::warn!("Discarding corrupt persisted session: {}", e);
                self.store.remove(SESSION_STORE_KEY);
                None
            }
        }
    }

    /// Sets and persists the logged-in user
    pub fn complete_login(&self, user: UserRef) -> Result<(), ClientError> {
        let raw = serde_json::to_string(&user)?;
        self.store.set(SESSION_STORE_KEY, &raw)?;
        self.session.set_user(user);
        Ok(())
    }

    /// Clears the session, the persisted copy and the dedupe set
    pub fn logout(&self) {
        self.session.clear_user();
        self.uploaded.clear();
        self.store.remove(SESSION_STORE_KEY);
        log::info!("Session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use uuid::Uuid;

    fn test_user() -> UserRef {
        UserRef {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        }
    }

    fn test_context() -> ClientContext {
        ClientContext::new(ClientConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_require_user_fails_when_logged_out() {
        let state = SessionState::new();
        assert!(matches!(
            state.require_user(),
            Err(ClientError::Unauthenticated)
        ));
    }

    #[test]
    fn test_loading_guard_restores_flag() {
        let state = SessionState::new();
        {
            let _guard = state.begin_loading();
            assert!(state.is_loading());
        }
        assert!(!state.is_loading());
    }

    #[test]
    fn test_login_persists_and_restores() {
        let store = Arc::new(MemoryStore::new());
        let user = test_user();

        let context = ClientContext::new(ClientConfig::default(), store.clone());
        context.complete_login(user.clone()).unwrap();

        // A fresh context over the same store sees the session again
        let fresh = ClientContext::new(ClientConfig::default(), store);
        assert_eq!(fresh.restore_session(), Some(user.clone()));
        assert_eq!(fresh.session.current_user(), Some(user));
    }

    #[test]
    fn test_logout_clears_everything() {
        let context = test_context();
        context.complete_login(test_user()).unwrap();
        context.uploaded.insert("photo.jpg");

        context.logout();

        assert_eq!(context.session.current_user(), None);
        assert!(context.uploaded.is_empty());
        assert_eq!(context.restore_session(), None);
    }

    #[test]
    fn test_corrupt_session_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.set(SESSION_STORE_KEY, "not json").unwrap();

        let context = ClientContext::new(ClientConfig::default(), store.clone());
        assert_eq!(context.restore_session(), None);
        assert_eq!(store.get(SESSION_STORE_KEY), None);
    }
}
