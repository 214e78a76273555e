//! Authentication error types.
//!
//! Every failure coming out of the HTTP boundary is normalized once into an
//! [`ApiError`] and then propagated unchanged to the session manager and the
//! forms that triggered it.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Fallback message for a failed login.
pub const LOGIN_FAILED: &str = "Error en el login";

/// Fallback message for a failed registration.
pub const REGISTER_FAILED: &str = "Error en el registro";

/// Fallback message for a failed profile fetch.
pub const PROFILE_FAILED: &str = "Error al obtener perfil";

/// Broad category of an API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network unreachable, connection refused or timed out
    Transport,
    /// 401/403: invalid or rejected credentials
    Auth,
    /// 400/422: malformed request data
    Validation,
    /// 5xx
    Server,
    /// The session changed while the request was in flight
    Cancelled,
    /// Anything else
    Unknown,
}

/// A normalized API error carrying a display message and the HTTP status.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable message, safe to show in a form
    pub message: String,
    /// HTTP status, if a response was received
    pub status: Option<u16>,
    /// Parsed JSON body of the error response, if any
    pub body: Option<Value>,
}

impl ApiError {
    /// Create an error without a response attached
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Error returned for a result that arrived after the session moved on.
    pub fn cancelled() -> Self {
        Self::new(
            ErrorKind::Cancelled,
            "La sesión cambió mientras la petición estaba en curso",
        )
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// The message is picked from, in order: the body's `message` field, the
    /// body's `detail` field, a default for the status code, and `fallback`.
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code
    /// * `body` - Parsed JSON body, if the response had one
    /// * `fallback` - Operation-specific message used when nothing better exists
    pub fn from_status(status: u16, body: Option<Value>, fallback: &str) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| string_field(b, "message").or_else(|| string_field(b, "detail")))
            .or_else(|| status_message(status).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());

        Self {
            kind: kind_for_status(status),
            message,
            status: Some(status),
            body,
        }
    }

    /// Build an error from a transport-level `reqwest` failure.
    pub fn from_transport(err: &reqwest::Error, fallback: &str) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), None, fallback);
        }

        let (kind, message) = if err.is_timeout() {
            (
                ErrorKind::Transport,
                "La petición excedió el tiempo de espera".to_string(),
            )
        } else if err.is_connect() {
            (
                ErrorKind::Transport,
                "No se pudo conectar con el servidor".to_string(),
            )
        } else if err.is_decode() {
            (
                ErrorKind::Unknown,
                format!("{fallback}: respuesta inválida del servidor"),
            )
        } else if err.is_request() {
            (ErrorKind::Transport, fallback.to_string())
        } else {
            (ErrorKind::Unknown, fallback.to_string())
        };

        Self::new(kind, message)
    }

    /// Whether the server rejected the credentials with a 401
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Per-field messages from a validation response.
    ///
    /// Backends commonly answer a rejected registration with
    /// `{"email": ["..."], "password": ["..."]}`. Only string and
    /// string-array values are collected; `message` and `detail` are skipped.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields = BTreeMap::new();

        let Some(Value::Object(map)) = &self.body else {
            return fields;
        };

        for (field, value) in map {
            if field == "message" || field == "detail" {
                continue;
            }

            let messages: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };

            if !messages.is_empty() {
                fields.insert(field.clone(), messages);
            }
        }

        fields
    }
}

/// Default message for well-known status codes
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Datos inválidos"),
        401 => Some("Credenciales inválidas"),
        403 => Some("Acceso prohibido"),
        404 => Some("Recurso no encontrado"),
        500 => Some("Error del servidor"),
        _ => None,
    }
}

/// Map an HTTP status onto an [`ErrorKind`]
pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Auth,
        400 | 422 => ErrorKind::Validation,
        500..=599 => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    }
}

fn string_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
