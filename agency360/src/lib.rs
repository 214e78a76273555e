//! # Agency 360
//!
//! Headless session and authentication client for the Agency 360 campaign
//! dashboard backend.
//!
//! The crate covers everything between a login form and the REST API:
//! credential persistence, authenticated HTTP requests, the reactive session
//! state views render from, and the guard deciding which view may render.
//!
//! ## Architecture
//!
//! ```text
//! forms ──> SessionManager ──> AuthApi (ApiClient) ──> backend
//!              │    ▲                 │
//!              │    └── Invalidation ─┘  (401 clears credentials)
//!              ▼
//!        watch<AuthState> ──> RouteGuard ──> Navigator
//! ```
//!
//! - [`storage`]: key-value backends and the credential store
//! - [`client`]: HTTP client, shared credential handle, invalidations
//! - [`session`]: session state machine and navigation events
//! - [`guard`] / [`routes`]: view protection and the route table
//! - [`forms`]: client-side validation for login and registration
//! - [`config`]: environment-driven configuration
//!
//! ## Example
//!
//! ```no_run
//! use agency360::{ApiClient, AppConfig, CredentialStore, MemoryStore, SessionHandle, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let store = CredentialStore::new(Arc::new(MemoryStore::new()), config.auth.keys.clone(), config.auth.scheme);
//! let api = Arc::new(ApiClient::new(&config.api, SessionHandle::new(store))?);
//!
//! let session = Arc::new(SessionManager::new(api));
//! session.watch_invalidations();
//! session.initialize().await;
//! # Ok(())
//! # }
//! ```

/// Authentication types: errors, models and protocol selection.
pub mod auth;
pub use auth::{
    ApiError, ApiResult, AuthScheme, AuthState, Credentials, ErrorKind, LoginCredentials,
    RegisterData, SessionInfo, User, UserUpdate,
};

/// HTTP client and the credential handle it shares.
pub mod client;
pub use client::{ApiClient, AuthApi, Invalidation, SessionHandle};

/// Environment configuration.
pub mod config;
pub use config::{ApiConfig, AppConfig, AuthConfig, ConfigError};

/// Login and registration forms.
pub mod forms;
pub use forms::{FormError, LoginForm, RegisterForm};

/// Route guard.
pub mod guard;
pub use guard::{GuardDecision, GuardRequirement, Navigator, RouteGuard};

/// Route table.
pub mod routes;
pub use routes::Route;

/// Session state manager.
pub mod session;
pub use session::{SessionEvent, SessionManager};

/// Credential persistence.
pub mod storage;
pub use storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore, StorageKeys};
