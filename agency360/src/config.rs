//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Every value has a documented default so an empty
//! environment yields a working bearer-mode client.

use crate::auth::AuthScheme;
use crate::storage::{FileStore, StorageKeys};
use std::path::PathBuf;
use std::time::Duration;

/// Default backend URL
pub const DEFAULT_BASE_URL: &str = "https://artemisacrea.ddns.net/api/v1";

/// Default proxy URL (the dev server's `/api/proxy` rewrite)
pub const DEFAULT_PROXY_URL: &str = "http://localhost:5173/api/proxy";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Credential handling configuration
    pub auth: AuthConfig,
    /// Application metadata
    pub app: AppInfo,
    /// Verbose logging
    pub debug: bool,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API
    pub base_url: String,
    /// Proxy URL used instead of `base_url` when `use_proxy` is set
    pub proxy_url: String,
    /// Route requests through `proxy_url`
    pub use_proxy: bool,
    /// Overall per-request timeout
    pub timeout: Duration,
    /// Endpoint paths relative to the base URL
    pub endpoints: Endpoints,
}

/// Backend endpoint paths. These belong to the backend and are only
/// configurable so a different deployment can be targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: String,
    pub register: String,
    pub profile: String,
    /// Request used to validate Basic-Auth credentials
    pub probe: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: "token/".to_string(),
            register: "register/".to_string(),
            profile: "profile/".to_string(),
            probe: "?path=user/".to_string(),
        }
    }
}

/// Credential handling configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Authentication protocol variant
    pub scheme: AuthScheme,
    /// Storage key names
    pub keys: StorageKeys,
    /// Session file location; `None` keeps credentials in memory only
    pub store_path: Option<PathBuf>,
}

/// Application metadata shown by the client
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Start App - Agency 360".to_string(),
            version: "1.0.0".to_string(),
            description: "Aplicación de dashboard para gestión de campañas".to_string(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with every other value defaulted
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            use_proxy: false,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            endpoints: Endpoints::default(),
        }
    }

    /// URL requests are actually sent to
    pub fn effective_base_url(&self) -> &str {
        if self.use_proxy {
            &self.proxy_url
        } else {
            &self.base_url
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scheme: AuthScheme::default(),
            keys: StorageKeys::default(),
            store_path: FileStore::default_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Recognized variables:
    /// - `AGENCY_API_BASE_URL` (default: `https://artemisacrea.ddns.net/api/v1`)
    /// - `AGENCY_API_PROXY_URL` (default: `http://localhost:5173/api/proxy`)
    /// - `AGENCY_API_USE_PROXY` (default: `false`)
    /// - `AGENCY_API_TIMEOUT_MS` (default: `10000`)
    /// - `AGENCY_AUTH_SCHEME`: `bearer` or `basic` (default: `bearer`)
    /// - `AGENCY_TOKEN_KEY`, `AGENCY_USERNAME_KEY`, `AGENCY_PASSWORD_KEY`
    ///   (defaults: `auth_token`, `auth_username`, `auth_password`)
    /// - `AGENCY_STORE_PATH` (default: `<data dir>/agency360/session.json`;
    ///   `memory` disables persistence)
    /// - `AGENCY_APP_NAME`, `AGENCY_APP_VERSION`, `AGENCY_DEBUG`
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults_api = ApiConfig::default();
        let defaults_keys = StorageKeys::default();
        let defaults_app = AppInfo::default();

        let timeout_ms = match lookup("AGENCY_API_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "AGENCY_API_TIMEOUT_MS".to_string(),
                reason: format!("'{raw}' is not a number of milliseconds"),
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let scheme = match lookup("AGENCY_AUTH_SCHEME") {
            Some(raw) => raw.parse::<AuthScheme>().map_err(|e| ConfigError::Invalid {
                var: "AGENCY_AUTH_SCHEME".to_string(),
                reason: e.to_string(),
            })?,
            None => AuthScheme::default(),
        };

        let store_path = match lookup("AGENCY_STORE_PATH") {
            Some(raw) if raw.eq_ignore_ascii_case("memory") => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => FileStore::default_path(),
        };

        let api = ApiConfig {
            base_url: lookup("AGENCY_API_BASE_URL").unwrap_or(defaults_api.base_url),
            proxy_url: lookup("AGENCY_API_PROXY_URL").unwrap_or(defaults_api.proxy_url),
            use_proxy: parse_or(&lookup, "AGENCY_API_USE_PROXY", false),
            timeout: Duration::from_millis(timeout_ms),
            endpoints: Endpoints::default(),
        };

        let auth = AuthConfig {
            scheme,
            keys: StorageKeys {
                token: lookup("AGENCY_TOKEN_KEY").unwrap_or(defaults_keys.token),
                username: lookup("AGENCY_USERNAME_KEY").unwrap_or(defaults_keys.username),
                password: lookup("AGENCY_PASSWORD_KEY").unwrap_or(defaults_keys.password),
            },
            store_path,
        };

        let app = AppInfo {
            name: lookup("AGENCY_APP_NAME").unwrap_or(defaults_app.name),
            version: lookup("AGENCY_APP_VERSION").unwrap_or(defaults_app.version),
            description: defaults_app.description,
        };

        let config = AppConfig {
            api,
            auth,
            app,
            debug: parse_or(&lookup, "AGENCY_DEBUG", false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (var, url) = if self.api.use_proxy {
            ("AGENCY_API_PROXY_URL", &self.api.proxy_url)
        } else {
            ("AGENCY_API_BASE_URL", &self.api.base_url)
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: var.to_string(),
                reason: format!("'{url}' must start with http:// or https://"),
            });
        }

        if self.api.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "AGENCY_API_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let keys = &self.auth.keys;
        for (var, key) in [
            ("AGENCY_TOKEN_KEY", &keys.token),
            ("AGENCY_USERNAME_KEY", &keys.username),
            ("AGENCY_PASSWORD_KEY", &keys.password),
        ] {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }
        }

        if keys.token == keys.username || keys.token == keys.password || keys.username == keys.password
        {
            return Err(ConfigError::Invalid {
                var: "AGENCY_TOKEN_KEY".to_string(),
                reason: "Storage keys must be distinct".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            app: AppInfo::default(),
            debug: false,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_source(source(&[])).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.effective_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.auth.scheme, AuthScheme::Bearer);
        assert_eq!(config.auth.keys, StorageKeys::default());
        assert_eq!(config.app.name, "Start App - Agency 360");
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_source(source(&[
            ("AGENCY_API_USE_PROXY", "true"),
            ("AGENCY_API_PROXY_URL", "http://localhost:8080/api/proxy"),
            ("AGENCY_AUTH_SCHEME", "basic"),
            ("AGENCY_TOKEN_KEY", "jwt"),
            ("AGENCY_STORE_PATH", "memory"),
            ("AGENCY_API_TIMEOUT_MS", "2500"),
            ("AGENCY_DEBUG", "true"),
        ]))
        .unwrap();

        assert_eq!(
            config.api.effective_base_url(),
            "http://localhost:8080/api/proxy"
        );
        assert_eq!(config.auth.scheme, AuthScheme::BasicProbe);
        assert_eq!(config.auth.keys.token, "jwt");
        assert_eq!(config.auth.store_path, None);
        assert_eq!(config.api.timeout, Duration::from_millis(2500));
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_scheme() {
        let err = AppConfig::from_source(source(&[("AGENCY_AUTH_SCHEME", "oauth")])).unwrap_err();
        assert!(err.to_string().contains("AGENCY_AUTH_SCHEME"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = AppConfig::from_source(source(&[("AGENCY_API_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "AGENCY_API_TIMEOUT_MS"));

        let err = AppConfig::from_source(source(&[("AGENCY_API_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = AppConfig::from_source(source(&[("AGENCY_API_BASE_URL", "/api/v1")])).unwrap_err();
        assert!(err.to_string().contains("AGENCY_API_BASE_URL"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = AppConfig::from_source(source(&[("AGENCY_USERNAME_KEY", "auth_token")]))
            .unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            std::env::set_var("AGENCY_API_BASE_URL", "http://127.0.0.1:9000/api/v1");
        }
        let config = AppConfig::from_env();
        unsafe {
            std::env::remove_var("AGENCY_API_BASE_URL");
        }
        assert_eq!(config.unwrap().api.base_url, "http://127.0.0.1:9000/api/v1");
    }
}
