//! Durable key-value storage for session credentials.
//!
//! The backends mirror what a browser offers through `localStorage`: flat
//! string keys, flat string values, synchronous access. Two backends are
//! provided:
//! - [`FileStore`]: one JSON object on disk (default for the CLI)
//! - [`MemoryStore`]: process-local map (tests, ephemeral sessions)
//!
//! [`CredentialStore`] sits on top and knows which keys make up a complete
//! credential set for the active [`AuthScheme`](crate::auth::AuthScheme).

pub mod credentials;
pub mod file;
pub mod memory;

pub use credentials::{CredentialStore, StorageKeys};
pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, read-only filesystem, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a flat JSON object of strings
    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backend is disabled or unreachable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A flat string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// A store whose every operation fails, as when the host has storage turned
/// off.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}
