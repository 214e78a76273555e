//! Credential persistence on top of a [`KeyValueStore`].

use super::{KeyValueStore, StorageResult};
use crate::auth::{AuthScheme, Credentials};
use std::sync::Arc;

/// Key names under which credentials are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Bearer token key
    pub token: String,
    /// Basic-Auth username key
    pub username: String,
    /// Basic-Auth password key
    pub password: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: "auth_token".to_string(),
            username: "auth_username".to_string(),
            password: "auth_password".to_string(),
        }
    }
}

/// Reads and writes the credential set for one [`AuthScheme`].
///
/// Storage failures never escape `load`: an unreadable store is the same as
/// an empty one.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    scheme: AuthScheme,
}

impl CredentialStore {
    /// Create a credential store
    ///
    /// # Arguments
    ///
    /// * `backend` - Key-value backend to persist into
    /// * `keys` - Key names for the token, username and password
    /// * `scheme` - Scheme deciding which keys form a complete set
    pub fn new(backend: Arc<dyn KeyValueStore>, keys: StorageKeys, scheme: AuthScheme) -> Self {
        Self {
            backend,
            keys,
            scheme,
        }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Load the stored credentials.
    ///
    /// Returns `None` if any field required by the scheme is missing or
    /// empty, or if the backend cannot be read.
    pub fn load(&self) -> Option<Credentials> {
        match self.try_load() {
            Ok(credentials) => credentials.filter(Credentials::is_complete),
            Err(e) => {
                log::warn!("Credential storage unreadable, treating as signed out: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> StorageResult<Option<Credentials>> {
        match self.scheme {
            AuthScheme::Bearer => Ok(self
                .backend
                .get(&self.keys.token)?
                .map(|token| Credentials::Bearer { token })),
            AuthScheme::BasicProbe => {
                let username = self.backend.get(&self.keys.username)?;
                let password = self.backend.get(&self.keys.password)?;
                Ok(match (username, password) {
                    (Some(username), Some(password)) => {
                        Some(Credentials::Basic { username, password })
                    }
                    _ => None,
                })
            }
        }
    }

    /// Persist a credential set.
    ///
    /// Keys belonging to the other scheme are removed so the store never
    /// holds a token and a password pair at once.
    pub fn save(&self, credentials: &Credentials) -> StorageResult<()> {
        if credentials.scheme() != self.scheme {
            log::warn!(
                "Saving {} credentials into a {} store",
                credentials.scheme(),
                self.scheme
            );
        }

        match credentials {
            Credentials::Bearer { token } => {
                self.backend.set(&self.keys.token, token)?;
                self.backend.remove(&self.keys.username)?;
                self.backend.remove(&self.keys.password)?;
            }
            Credentials::Basic { username, password } => {
                self.backend.set(&self.keys.username, username)?;
                self.backend.set(&self.keys.password, password)?;
                self.backend.remove(&self.keys.token)?;
            }
        }
        Ok(())
    }

    /// Remove every credential key, whatever the scheme.
    pub fn clear(&self) -> StorageResult<()> {
        // Try every key even if one removal fails
        let results = [
            self.backend.remove(&self.keys.token),
            self.backend.remove(&self.keys.username),
            self.backend.remove(&self.keys.password),
        ];
        results.into_iter().collect()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("keys", &self.keys)
            .field("scheme", &self.scheme)
            .finish()
    }
}
