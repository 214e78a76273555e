//! Command execution against a live session.

use crate::commands::{Command, HELP};
use agency360::auth::{ApiError, AuthState, UserUpdate};
use agency360::client::{ApiClient, AuthApi, SessionHandle};
use agency360::config::AppConfig;
use agency360::forms::{FormError, LoginForm, RegisterForm};
use agency360::guard::{Guarded, RouteGuard};
use agency360::routes::Route;
use agency360::session::{SessionEvent, SessionManager};
use agency360::storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;

/// Source for values a command was given without
pub trait Prompt {
    /// Ask for `label`. `secret` is set for passwords.
    fn ask(&mut self, label: &str, secret: bool) -> Result<String>;
}

/// Whether the interactive loop should keep going
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(Vec<String>),
    Quit,
}

/// A client session wired from configuration
pub struct App {
    config: AppConfig,
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
    events: broadcast::Receiver<SessionEvent>,
    watcher: JoinHandle<()>,
}

impl App {
    /// Build the client stack and run the start-up credential check.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub async fn start(config: AppConfig) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = match &config.auth.store_path {
            Some(path) => {
                log::debug!("Session file: {}", path.display());
                Arc::new(FileStore::new(path.clone()))
            }
            None => Arc::new(MemoryStore::new()),
        };
        let store = CredentialStore::new(backend, config.auth.keys.clone(), config.auth.scheme);

        let api = Arc::new(
            ApiClient::new(&config.api, SessionHandle::new(store))
                .context("Failed to create API client")?,
        );
        let session = Arc::new(SessionManager::new(api.clone()));
        let events = session.events();
        let watcher = session.watch_invalidations();

        let state = session.initialize().await;
        log::info!(
            "Connected to {} ({} auth, signed in: {})",
            api.base_url(),
            config.auth.scheme,
            state.is_authenticated
        );

        Ok(Self {
            config,
            api,
            session,
            events,
            watcher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Run one command and collect the lines to show.
    ///
    /// Backend failures are reported in the output, not as errors.
    ///
    /// # Errors
    ///
    /// Returns error only if prompting for a missing value fails
    pub async fn execute(&mut self, command: Command, prompt: &mut dyn Prompt) -> Result<Flow> {
        let mut lines = match command {
            Command::Login { email, password } => {
                let form = LoginForm::new(
                    given_or_ask(email, prompt, "Email", false)?,
                    given_or_ask(password, prompt, "Password", true)?,
                );
                self.login(&form).await
            }
            Command::Register {
                email,
                username,
                password,
                password2,
            } => {
                let form = RegisterForm {
                    email: given_or_ask(email, prompt, "Email", false)?,
                    username: given_or_ask(username, prompt, "Username", false)?,
                    password: given_or_ask(password, prompt, "Password", true)?,
                    password2: given_or_ask(password2, prompt, "Confirm Password", true)?,
                };
                self.register(&form).await
            }
            Command::Profile => self.profile().await,
            Command::Logout => {
                self.session.logout();
                vec!["Sesión cerrada".to_string()]
            }
            Command::Status => self.status(),
            Command::Route(path) => self.route(&path),
            Command::Help => vec![HELP.trim_end().to_string()],
            Command::Quit => return Ok(Flow::Quit),
        };

        // Let the invalidation watcher catch up before reporting events
        tokio::task::yield_now().await;
        lines.extend(self.drain_events().iter().map(|event| format!("-> {event}")));

        Ok(Flow::Continue(lines))
    }

    /// Session events received since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Skipped {} session events", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }

    async fn login(&self, form: &LoginForm) -> Vec<String> {
        if !form.email_is_valid() {
            log::warn!("'{}' does not look like an email address", form.email);
        }

        match form.submit(&self.session).await {
            Ok(info) => vec![format!(
                "Sesión iniciada como {} ({})",
                info.user.display_name(),
                info.user.initials()
            )],
            Err(e) => {
                let mut lines = error_lines(&e);
                let unmet = form.password_checks().unmet();
                if !unmet.is_empty() {
                    lines.push(format!("  password: {}", unmet.join("; ")));
                }
                lines
            }
        }
    }

    async fn register(&self, form: &RegisterForm) -> Vec<String> {
        match form.submit(&self.session).await {
            Ok(user) => vec![format!(
                "Usuario {} registrado. Inicia sesión para continuar.",
                user.username
            )],
            Err(FormError::Invalid(errors)) => errors.iter().map(|e| format!("  {e}")).collect(),
            Err(FormError::Api(e)) => error_lines(&e),
        }
    }

    async fn profile(&self) -> Vec<String> {
        if !self.session.is_authenticated() {
            return vec!["No hay sesión activa".to_string()];
        }

        match self.api.profile().await {
            Ok(user) => {
                let lines = vec![
                    format!("id:       {}", user.id),
                    format!("email:    {}", user.email),
                    format!("username: {}", user.username),
                ];
                self.session.update_user(UserUpdate {
                    id: Some(user.id),
                    email: Some(user.email),
                    username: Some(user.username),
                });
                lines
            }
            Err(e) => error_lines(&e),
        }
    }

    fn status(&self) -> Vec<String> {
        let mut lines = vec![describe_state(&self.session.state())];
        lines.push(format!(
            "Servidor: {} ({})",
            self.api.base_url(),
            self.config.auth.scheme
        ));
        lines
    }

    fn route(&self, path: &str) -> Vec<String> {
        let route = Route::resolve(path);
        let mut guard = RouteGuard::for_route(route, self.session.navigator());

        match guard.render(&self.session.state(), route) {
            Guarded::Content(route) => vec![format!("{path} -> {route}")],
            Guarded::Placeholder(placeholder) => vec![format!("{path} -> {placeholder}")],
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn given_or_ask(
    value: Option<String>,
    prompt: &mut dyn Prompt,
    label: &str,
    secret: bool,
) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt.ask(label, secret),
    }
}

fn describe_state(state: &AuthState) -> String {
    let mut line = match (&state.user, state.is_authenticated, state.is_loading) {
        (_, _, true) => "Verificando autenticación...".to_string(),
        (Some(user), true, false) => format!(
            "Autenticado como {} <{}>",
            user.display_name(),
            user.email
        ),
        _ => "No autenticado".to_string(),
    };
    if let Some(error) = &state.error {
        line.push_str(&format!(" (último error: {error})"));
    }
    line
}

fn error_lines(error: &ApiError) -> Vec<String> {
    let mut lines = vec![format!("Error: {error}")];
    for (field, messages) in error.field_errors() {
        lines.push(format!("  {field}: {}", messages.join(" ")));
    }
    lines
}
