//! Authentication data models.

use super::scheme::AuthScheme;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::fmt;

/// Name shown in the dashboard header when the user has no username.
pub const DEFAULT_DISPLAY_NAME: &str = "Admin Start";

/// User model as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

impl User {
    /// Synthesize a user from a stored login name.
    ///
    /// Basic-Auth backends have no login response to read a user from, so the
    /// login name fills every field.
    pub fn from_login_name(name: &str) -> Self {
        Self {
            id: name.to_string(),
            email: name.to_string(),
            username: name.to_string(),
        }
    }

    /// Name to show in the UI
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            &self.username
        }
    }

    /// First two characters of the username, upper-cased
    pub fn initials(&self) -> String {
        self.display_name()
            .chars()
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Shallow-merge the fields present in `update`
    pub fn merge(&mut self, update: UserUpdate) {
        if let Some(id) = update.id {
            self.id = id;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(username) = update.username {
            self.username = username;
        }
    }
}

/// Partial user used by `update_user`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Stored credentials. Exactly one variant is in use per deployment.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Opaque access token sent as `Authorization: Bearer`
    Bearer { token: String },
    /// Username/password pair sent as `Authorization: Basic`
    Basic { username: String, password: String },
}

impl Credentials {
    /// Scheme this credential set belongs to
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Self::Bearer { .. } => AuthScheme::Bearer,
            Self::Basic { .. } => AuthScheme::BasicProbe,
        }
    }

    /// True when no field is empty
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Bearer { token } => !token.is_empty(),
            Self::Basic { username, password } => !username.is_empty() && !password.is_empty(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// User login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// User registration request. Never persisted.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
}

impl fmt::Debug for RegisterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterData")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"***")
            .field("password2", &"***")
            .finish()
    }
}

/// Outcome of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Access token (bearer mode only)
    pub access: Option<String>,
    /// Refresh token, if the backend issued one
    pub refresh: Option<String>,
    /// Logged-in user
    pub user: User,
    /// Credential generation this login installed
    pub generation: u64,
}

/// Reactive session state observed by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// State before the mount-time credential check has run
    pub fn initial() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    /// Settled, signed-out state
    pub fn anonymous() -> Self {
        Self {
            is_loading: false,
            ..Self::initial()
        }
    }

    /// Settled, signed-in state
    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("invalid user id: {other}"))),
    }
}
