//! Login and registration forms.
//!
//! Client-side checks run before anything is sent. Server-side field errors
//! come back through [`ApiError::field_errors`].

use crate::auth::{ApiError, LoginCredentials, RegisterData, SessionInfo, User};
use crate::guard::Navigator;
use crate::routes::Route;
use crate::session::SessionManager;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .expect("Invalid regex pattern - this is a compile-time constant")
});

static SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/*\-+]").expect("Invalid regex pattern - this is a compile-time constant")
});

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum username length in characters
pub const MIN_USERNAME_LEN: usize = 3;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Individual password requirements, reported separately so each one can be
/// shown as met or unmet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
    pub length: bool,
    pub letters_and_numbers: bool,
    pub special_chars: bool,
}

impl PasswordChecks {
    pub fn of(password: &str) -> Self {
        Self {
            length: password.chars().count() >= MIN_PASSWORD_LEN,
            letters_and_numbers: password.chars().any(|c| c.is_ascii_alphabetic())
                && password.chars().any(|c| c.is_ascii_digit()),
            special_chars: SPECIAL.is_match(password),
        }
    }

    pub fn all(&self) -> bool {
        self.length && self.letters_and_numbers && self.special_chars
    }

    /// Messages for the requirements not met, in display order
    pub fn unmet(&self) -> Vec<&'static str> {
        [
            (self.length, "At least 8 characters"),
            (self.letters_and_numbers, "Must contain letters and numbers"),
            (self.special_chars, "Must contain one of / * - +"),
        ]
        .into_iter()
        .filter(|(met, _)| !met)
        .map(|(_, message)| message)
        .collect()
    }
}

/// Form field a validation message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    Username,
    Password,
    Password2,
}

impl Field {
    /// Name of the field in request and error bodies
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
            Self::Password => "password",
            Self::Password2 => "password2",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a form submission did not go through
#[derive(Debug, Error)]
pub enum FormError {
    /// Client-side validation failed; no request was sent
    #[error("{} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sign-in form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email_is_valid(&self) -> bool {
        is_valid_email(&self.email)
    }

    /// Password hints shown next to the field. They do not block submission.
    pub fn password_checks(&self) -> PasswordChecks {
        PasswordChecks::of(&self.password)
    }

    /// Clear any previous error and log in.
    ///
    /// On success the session manager requests the dashboard view.
    pub async fn submit(&self, session: &SessionManager) -> Result<SessionInfo, ApiError> {
        session.clear_error();
        log::debug!("Submitting login form");
        session
            .login(&LoginCredentials::new(&self.email, &self.password))
            .await
    }
}

/// Account creation form
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
}

impl RegisterForm {
    pub fn passwords_match(&self) -> bool {
        !self.password2.is_empty() && self.password == self.password2
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Every failing field, in form order
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: Field::Email,
                message: "Please enter a valid email",
            });
        }
        if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.push(FieldError {
                field: Field::Username,
                message: "Username must be at least 3 characters",
            });
        }

        errors.extend(
            PasswordChecks::of(&self.password)
                .unmet()
                .into_iter()
                .map(|message| FieldError {
                    field: Field::Password,
                    message,
                }),
        );

        if !self.passwords_match() {
            errors.push(FieldError {
                field: Field::Password2,
                message: "Passwords do not match",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Clear any previous error, validate, register, then go to the login view.
    ///
    /// # Errors
    ///
    /// * `FormError::Invalid` - Validation failed; nothing was sent
    /// * `FormError::Api` - The backend refused the registration
    pub async fn submit(&self, session: &SessionManager) -> Result<User, FormError> {
        session.clear_error();
        self.validate().map_err(FormError::Invalid)?;

        let data = RegisterData {
            email: self.email.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            password2: self.password2.clone(),
        };
        let user = session.register(&data).await?;

        session.navigator().navigate(Route::Login, false);
        Ok(user)
    }
}
