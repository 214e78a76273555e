//! Authentication protocol variants.

use super::models::{Credentials, LoginCredentials};
use std::fmt;
use std::str::FromStr;

/// How the client proves its identity to the backend.
///
/// One variant is selected per deployment; both share the same session
/// manager contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// `POST /token/` returns an access token sent as `Authorization: Bearer`
    #[default]
    Bearer,
    /// The username/password pair is stored as-is and validated by one probe
    /// request sent with `Authorization: Basic`
    BasicProbe,
}

impl AuthScheme {
    /// Credentials to install before the probe request (basic mode only)
    pub fn credentials_for_login(&self, login: &LoginCredentials) -> Option<Credentials> {
        match self {
            Self::Bearer => None,
            Self::BasicProbe => Some(Credentials::Basic {
                username: login.email.clone(),
                password: login.password.clone(),
            }),
        }
    }

    /// Whether stored credentials are trusted on startup without a request
    pub fn trusts_stored_credentials(&self) -> bool {
        matches!(self, Self::BasicProbe)
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => write!(f, "bearer"),
            Self::BasicProbe => write!(f, "basic"),
        }
    }
}

/// Unrecognized scheme name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown auth scheme '{0}'. Use 'bearer' or 'basic'")]
pub struct UnknownScheme(pub String);

impl FromStr for AuthScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bearer" | "token" | "jwt" => Ok(Self::Bearer),
            "basic" | "basic-probe" | "probe" => Ok(Self::BasicProbe),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}
