//! HTTP client wrapper for the dashboard backend.
//!
//! [`ApiClient`] attaches the active credentials to every request, turns
//! failures into [`ApiError`](crate::auth::ApiError) once, and reports
//! rejected credentials as an [`Invalidation`] instead of navigating.
//! [`AuthApi`] is the seam the session manager depends on.

pub mod api;
pub mod handle;

pub use api::ApiClient;
pub use handle::SessionHandle;

use crate::auth::{
    ApiResult, AuthScheme, Credentials, LoginCredentials, RegisterData, SessionInfo, User,
};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Notification that the backend rejected the stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    /// HTTP status that triggered it
    pub status: u16,
    /// Endpoint the rejected request was sent to
    pub endpoint: String,
}

/// Authentication operations the session manager relies on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Protocol variant in use
    fn scheme(&self) -> AuthScheme;

    /// Credentials currently held in memory
    fn credentials(&self) -> Option<Credentials>;

    /// Authenticate and install the resulting credentials
    async fn login(&self, credentials: &LoginCredentials) -> ApiResult<SessionInfo>;

    /// Create an account. Does not authenticate.
    async fn register(&self, data: &RegisterData) -> ApiResult<User>;

    /// Fetch the authenticated user's profile
    async fn profile(&self) -> ApiResult<User>;

    /// Drop credentials from memory and storage
    fn logout(&self);

    /// Drop credentials only if they still belong to `generation`.
    ///
    /// Returns `true` if something was dropped.
    fn revoke(&self, generation: u64) -> bool;

    /// Subscribe to session invalidations
    fn subscribe(&self) -> broadcast::Receiver<Invalidation>;
}
