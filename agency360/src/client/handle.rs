//! In-memory credential state shared between the client and its owners.

use crate::auth::{AuthScheme, Credentials};
use crate::storage::CredentialStore;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to the credentials the client currently authenticates with.
///
/// Cloning is cheap; all clones see the same state. Every change bumps a
/// generation counter so that a response belonging to an older session can
/// be recognized and ignored.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    inner: Arc<Mutex<HandleState>>,
    store: CredentialStore,
}

#[derive(Debug)]
struct HandleState {
    credentials: Option<Credentials>,
    generation: u64,
}

impl SessionHandle {
    /// Create a handle seeded from the credential store
    pub fn new(store: CredentialStore) -> Self {
        let credentials = store.load();
        if credentials.is_some() {
            log::debug!("Restored stored {} credentials", store.scheme());
        }

        Self {
            inner: Arc::new(Mutex::new(HandleState {
                credentials,
                generation: 0,
            })),
            store,
        }
    }

    fn state(&self) -> MutexGuard<'_, HandleState> {
        // The state is two plain fields; a panic elsewhere cannot leave it torn
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn scheme(&self) -> AuthScheme {
        self.store.scheme()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Current credentials, if any
    pub fn credentials(&self) -> Option<Credentials> {
        self.state().credentials.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().credentials.is_some()
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Credentials and generation read under one lock
    pub fn snapshot(&self) -> (Option<Credentials>, u64) {
        let state = self.state();
        (state.credentials.clone(), state.generation)
    }

    /// Install and persist credentials if nothing changed since `expected`.
    ///
    /// # Returns
    ///
    /// * `Some(generation)` - The new generation owning these credentials
    /// * `None` - The session moved on; nothing was installed
    pub fn install(&self, expected: u64, credentials: Credentials) -> Option<u64> {
        let mut state = self.state();
        if state.generation != expected {
            log::debug!(
                "Discarding credentials for generation {} (now {})",
                expected,
                state.generation
            );
            return None;
        }

        if let Err(e) = self.store.save(&credentials) {
            log::warn!("Failed to persist credentials: {}", e);
        }
        state.credentials = Some(credentials);
        state.generation += 1;
        Some(state.generation)
    }

    /// Drop credentials from memory and storage unconditionally.
    pub fn clear(&self) {
        let mut state = self.state();
        self.clear_locked(&mut state);
    }

    /// Drop credentials only if they still belong to `generation`.
    ///
    /// Returns `true` if credentials were present and cleared.
    pub fn clear_if(&self, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation || state.credentials.is_none() {
            return false;
        }
        self.clear_locked(&mut state);
        true
    }

    fn clear_locked(&self, state: &mut HandleState) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear stored credentials: {}", e);
        }
        state.credentials = None;
        state.generation += 1;
    }
}
