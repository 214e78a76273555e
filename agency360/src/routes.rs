//! Application routes.

use crate::guard::GuardRequirement;
use std::fmt;

/// Views of the dashboard application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    /// Main view, guarded
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Login, Route::Register, Route::Dashboard];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/",
        }
    }

    /// Exact match on a known path. Trailing slashes and query strings are
    /// ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Resolve any path to a route; unknown paths land on the dashboard.
    pub fn resolve(path: &str) -> Self {
        Self::from_path(path).unwrap_or_else(|| {
            log::debug!("Unknown route {}, redirecting to /", path);
            Self::Dashboard
        })
    }

    /// Guard wrapping this route's view
    pub fn guard(&self) -> GuardRequirement {
        match self {
            Self::Login | Self::Register => GuardRequirement::anonymous_only(Self::Dashboard),
            Self::Dashboard => GuardRequirement::default(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
