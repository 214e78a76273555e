//! Session state manager.
//!
//! Owns the reactive [`AuthState`] the UI renders from and drives its
//! transitions:
//!
//! - **Initial** (`is_loading`) until [`SessionManager::initialize`] checks
//!   the stored credentials
//! - **Anonymous** (`!is_authenticated`, `!is_loading`)
//! - **Authenticated** (`is_authenticated`, `user` set)
//!
//! `login`, `register`, `logout`, `clear_error` and `update_user` are the only
//! other ways the state changes. Navigation is never performed here; it is
//! requested through [`SessionEvent`]s the UI layer subscribes to.
//!
//! Every asynchronous operation is tagged with the epoch it started in.
//! `login`, `logout` and `initialize` start a new epoch, so a response that
//! arrives after the session moved on is dropped instead of overwriting the
//! newer state.

use crate::auth::{
    ApiError, ApiResult, AuthState, Credentials, LoginCredentials, RegisterData, SessionInfo,
    User, UserUpdate,
};
use crate::client::{AuthApi, Invalidation};
use crate::guard::Navigator;
use crate::routes::Route;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Requests from the session layer to the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show `to`
    Navigate { to: Route, replace: bool },
    /// The backend rejected the stored credentials
    Invalidated(Invalidation),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { to, replace: true } => write!(f, "redirect to {to}"),
            Self::Navigate { to, replace: false } => write!(f, "navigate to {to}"),
            Self::Invalidated(invalidation) => write!(
                f,
                "session rejected by {} ({})",
                invalidation.endpoint, invalidation.status
            ),
        }
    }
}

/// [`Navigator`] that forwards navigation as [`SessionEvent`]s
#[derive(Clone)]
pub struct SessionNavigator {
    events: broadcast::Sender<SessionEvent>,
}

impl Navigator for SessionNavigator {
    fn navigate(&self, to: Route, replace: bool) {
        let _ = self.events.send(SessionEvent::Navigate { to, replace });
    }
}

/// Reactive session state plus the operations that change it
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<SessionEvent>,
    epoch: Mutex<u64>,
}

impl SessionManager {
    /// Create a manager in the initial (loading) state
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        let (events, _) = broadcast::channel(32);

        Self {
            api,
            state,
            events,
            epoch: Mutex::new(0),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Receiver for navigation and invalidation events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Navigator emitting into this manager's event stream
    pub fn navigator(&self) -> SessionNavigator {
        SessionNavigator {
            events: self.events.clone(),
        }
    }

    fn epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new epoch, making every in-flight operation stale
    fn begin(&self) -> u64 {
        let mut epoch = self.epoch();
        *epoch += 1;
        *epoch
    }

    /// Apply `update` if `ticket` is still the current epoch.
    fn apply<F>(&self, ticket: u64, update: F) -> bool
    where
        F: FnOnce(&mut AuthState),
    {
        let epoch = self.epoch();
        if *epoch != ticket {
            log::debug!("Dropping stale session update (epoch {} < {})", ticket, *epoch);
            return false;
        }
        self.state.send_modify(update);
        true
    }

    fn navigate(&self, to: Route, replace: bool) {
        self.navigator().navigate(to, replace);
    }

    /// Mount-time credential check.
    ///
    /// Basic-Auth credentials are trusted as stored. A bearer token is
    /// validated with a profile request; if that fails the token is dropped.
    ///
    /// # Returns
    ///
    /// * `AuthState` - State after the check
    pub async fn initialize(&self) -> AuthState {
        let ticket = self.begin();

        let Some(credentials) = self.api.credentials() else {
            log::debug!("No stored credentials");
            self.apply(ticket, |s| *s = AuthState::anonymous());
            return self.state();
        };

        if self.api.scheme().trusts_stored_credentials() {
            if let Credentials::Basic { username, .. } = &credentials {
                let user = User::from_login_name(username);
                log::info!("Restored session for {}", username);
                self.apply(ticket, |s| *s = AuthState::authenticated(user));
                return self.state();
            }
        }

        match self.api.profile().await {
            Ok(user) => {
                log::info!("Restored session for {}", user.username);
                self.apply(ticket, |s| *s = AuthState::authenticated(user));
            }
            Err(e) => {
                log::info!("Stored session is no longer valid: {}", e);
                let epoch = self.epoch();
                if *epoch == ticket {
                    self.api.logout();
                    self.state.send_modify(|s| *s = AuthState::anonymous());
                }
            }
        }

        self.state()
    }

    /// Log in.
    ///
    /// On success the state becomes authenticated and a navigation to the
    /// dashboard is requested. On failure the message is stored in `error`
    /// and the same error is returned.
    ///
    /// # Errors
    ///
    /// * Any [`ApiError`] from the backend
    /// * `ErrorKind::Cancelled` if the session changed while waiting
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<SessionInfo> {
        let ticket = self.begin();
        self.apply(ticket, |s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.login(credentials).await {
            Ok(info) => {
                let user = info.user.clone();
                if !self.apply(ticket, |s| *s = AuthState::authenticated(user)) {
                    // Superseded: its credentials must not outlive it
                    if self.api.revoke(info.generation) {
                        log::debug!("Dropped credentials of a superseded login");
                    }
                    return Err(ApiError::cancelled());
                }
                self.navigate(Route::Dashboard, false);
                Ok(info)
            }
            Err(e) => {
                let signed_out = self.api.credentials().is_none();
                let message = e.message.clone();
                self.apply(ticket, |s| {
                    s.is_loading = false;
                    s.error = Some(message);
                    if signed_out {
                        s.user = None;
                        s.is_authenticated = false;
                    }
                });
                Err(e)
            }
        }
    }

    /// Register an account. Never authenticates.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ApiError`]; its message is also stored in
    /// `error`.
    pub async fn register(&self, data: &RegisterData) -> ApiResult<User> {
        let ticket = *self.epoch();
        self.apply(ticket, |s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self.api.register(data).await;
        match &result {
            Ok(_) => {
                self.apply(ticket, |s| s.is_loading = false);
            }
            Err(e) => {
                let message = e.message.clone();
                self.apply(ticket, |s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
            }
        }
        result
    }

    /// Drop credentials, reset to anonymous, request the login view.
    pub fn logout(&self) {
        {
            let mut epoch = self.epoch();
            *epoch += 1;
            self.api.logout();
            self.state.send_modify(|s| *s = AuthState::anonymous());
        }
        self.navigate(Route::Login, false);
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Shallow-merge `update` into the current user; no-op when signed out.
    pub fn update_user(&self, update: UserUpdate) {
        self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(user) => {
                user.merge(update);
                true
            }
            None => false,
        });
    }

    /// React to the backend rejecting the stored credentials.
    ///
    /// Ignored if credentials are present again by the time it is handled
    /// (a newer login already succeeded).
    pub fn handle_invalidation(&self, invalidation: &Invalidation) {
        {
            let _epoch = self.epoch();
            if self.api.credentials().is_some() {
                log::debug!("Ignoring invalidation from {}", invalidation.endpoint);
                return;
            }
            self.state.send_if_modified(|s| {
                let changed = s.is_authenticated || s.user.is_some();
                s.user = None;
                s.is_authenticated = false;
                changed
            });
        }

        let _ = self
            .events
            .send(SessionEvent::Invalidated(invalidation.clone()));
        self.navigate(Route::Login, true);
    }

    /// Forward the client's invalidations into this manager.
    ///
    /// The task ends when the manager is dropped.
    pub fn watch_invalidations(self: &Arc<Self>) -> JoinHandle<()> {
        let mut invalidations = self.api.subscribe();
        let manager = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match invalidations.recv().await {
                    Ok(invalidation) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        manager.handle_invalidation(&invalidation);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Missed {} session invalidations", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
