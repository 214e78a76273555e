//! Authentication types shared by the client, session manager and forms.
//!
//! - [`errors`]: the single [`ApiError`] produced at the HTTP boundary
//! - [`models`]: users, credentials, request payloads and session state
//! - [`scheme`]: bearer-token vs. Basic-Auth probe protocol selection

pub mod errors;
pub mod models;
pub mod scheme;

pub use errors::{ApiError, ApiResult, ErrorKind};
pub use models::{
    AuthState, Credentials, LoginCredentials, RegisterData, SessionInfo, User, UserUpdate,
};
pub use scheme::AuthScheme;
