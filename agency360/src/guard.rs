//! Route guard: decides whether a view may render for the current session.
//!
//! The guard never mutates session state. It reads [`AuthState`], asks a
//! [`Navigator`] to redirect when the state does not match its
//! [`GuardRequirement`], and hands back either the wrapped content or a
//! neutral placeholder.

use crate::auth::AuthState;
use crate::routes::Route;
use std::fmt;
use tokio::sync::watch;

/// Something that can change the current view
pub trait Navigator: Send + Sync {
    /// Navigate to `to`. `replace` replaces the current history entry.
    fn navigate(&self, to: Route, replace: bool);
}

/// What a guarded view requires of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardRequirement {
    /// Require an authenticated session (otherwise: require an anonymous one)
    pub require_auth: bool,
    /// Where to send a session that fails `require_auth`
    pub redirect_to: Route,
}

impl GuardRequirement {
    /// Only anonymous sessions may view; authenticated ones go to the dashboard
    pub fn anonymous_only(redirect_to: Route) -> Self {
        Self {
            require_auth: false,
            redirect_to,
        }
    }
}

impl Default for GuardRequirement {
    fn default() -> Self {
        Self {
            require_auth: true,
            redirect_to: Route::Login,
        }
    }
}

/// Outcome of evaluating a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still running
    Wait,
    /// Session does not match; navigate away
    Redirect(Route),
    /// Show the wrapped content
    Render,
}

/// Neutral content shown instead of a guarded view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Verifying,
    Redirecting,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verifying => write!(f, "Verificando autenticación..."),
            Self::Redirecting => write!(f, "Redirigiendo..."),
        }
    }
}

/// Either the guarded content or a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<C> {
    Content(C),
    Placeholder(Placeholder),
}

impl<C> Guarded<C> {
    pub fn content(self) -> Option<C> {
        match self {
            Self::Content(content) => Some(content),
            Self::Placeholder(_) => None,
        }
    }
}

/// Evaluate a requirement against a session state.
///
/// Authenticated sessions on an anonymous-only view always go to the
/// dashboard; `redirect_to` only applies to sessions failing `require_auth`.
pub fn evaluate(state: &AuthState, requirement: &GuardRequirement) -> GuardDecision {
    if state.is_loading {
        return GuardDecision::Wait;
    }

    match (requirement.require_auth, state.is_authenticated) {
        (true, false) => GuardDecision::Redirect(requirement.redirect_to),
        (false, true) => GuardDecision::Redirect(Route::Dashboard),
        _ => GuardDecision::Render,
    }
}

/// Stateful guard that navigates at most once per decision change.
pub struct RouteGuard<N> {
    requirement: GuardRequirement,
    navigator: N,
    last: Option<GuardDecision>,
}

impl<N: Navigator> RouteGuard<N> {
    pub fn new(requirement: GuardRequirement, navigator: N) -> Self {
        Self {
            requirement,
            navigator,
            last: None,
        }
    }

    /// Guard for a route's own view
    pub fn for_route(route: Route, navigator: N) -> Self {
        Self::new(route.guard(), navigator)
    }

    pub fn requirement(&self) -> GuardRequirement {
        self.requirement
    }

    /// Last decision taken, if any state was observed yet
    pub fn last_decision(&self) -> Option<GuardDecision> {
        self.last
    }

    /// Change the requirement; the next observation is evaluated afresh.
    pub fn set_requirement(&mut self, requirement: GuardRequirement) {
        if requirement != self.requirement {
            self.requirement = requirement;
            self.last = None;
        }
    }

    /// Evaluate `state` and navigate if this is a new redirect.
    pub fn observe(&mut self, state: &AuthState) -> GuardDecision {
        let decision = evaluate(state, &self.requirement);

        if let GuardDecision::Redirect(to) = decision {
            if self.last != Some(decision) {
                log::debug!(
                    "Guard redirect: require_auth={} authenticated={} -> {}",
                    self.requirement.require_auth,
                    state.is_authenticated,
                    to
                );
                self.navigator.navigate(to, true);
            }
        }

        self.last = Some(decision);
        decision
    }

    /// Observe `state` and return the content only if it may be shown.
    pub fn render<C>(&mut self, state: &AuthState, content: C) -> Guarded<C> {
        match self.observe(state) {
            GuardDecision::Wait => Guarded::Placeholder(Placeholder::Verifying),
            GuardDecision::Redirect(_) => Guarded::Placeholder(Placeholder::Redirecting),
            GuardDecision::Render => Guarded::Content(content),
        }
    }

    /// Re-evaluate on every state change until the sender is dropped.
    pub async fn run(mut self, mut states: watch::Receiver<AuthState>) {
        loop {
            let state = states.borrow_and_update().clone();
            self.observe(&state);

            if states.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingNavigator {
        visits: Arc<Mutex<Vec<(Route, bool)>>>,
    }

    impl RecordingNavigator {
        fn visits(&self) -> Vec<(Route, bool)> {
            self.visits.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, to: Route, replace: bool) {
            self.visits.lock().unwrap().push((to, replace));
        }
    }

    fn signed_in() -> AuthState {
        AuthState::authenticated(User::from_login_name("a@b.com"))
    }

    #[test]
    fn test_loading_waits_without_navigation() {
        let nav = RecordingNavigator::default();
        let mut guard = RouteGuard::new(GuardRequirement::default(), nav.clone());

        let out = guard.render(&AuthState::initial(), "dashboard");
        assert_eq!(out, Guarded::Placeholder(Placeholder::Verifying));
        assert!(nav.visits().is_empty());
    }

    #[test]
    fn test_protected_view_redirects_once() {
        let nav = RecordingNavigator::default();
        let mut guard = RouteGuard::new(GuardRequirement::default(), nav.clone());

        let anon = AuthState::anonymous();
        assert_eq!(
            guard.render(&anon, "dashboard"),
            Guarded::Placeholder(Placeholder::Redirecting)
        );
        // Same decision again, e.g. an error message was set
        let with_error = AuthState {
            error: Some("Credenciales inválidas".to_string()),
            ..AuthState::anonymous()
        };
        assert!(guard.render(&with_error, "dashboard").content().is_none());

        assert_eq!(nav.visits(), vec![(Route::Login, true)]);
    }

    #[test]
    fn test_anonymous_only_view_redirects_home() {
        let nav = RecordingNavigator::default();
        let mut guard = RouteGuard::for_route(Route::Login, nav.clone());

        assert_eq!(
            guard.render(&signed_in(), "login form"),
            Guarded::Placeholder(Placeholder::Redirecting)
        );
        assert_eq!(nav.visits(), vec![(Route::Dashboard, true)]);
    }

    #[test]
    fn test_matching_state_renders_content() {
        let nav = RecordingNavigator::default();
        let mut dashboard = RouteGuard::for_route(Route::Dashboard, nav.clone());
        let mut login = RouteGuard::for_route(Route::Login, nav.clone());

        assert_eq!(dashboard.render(&signed_in(), 1).content(), Some(1));
        assert_eq!(login.render(&AuthState::anonymous(), 2).content(), Some(2));
        assert!(nav.visits().is_empty());
    }

    #[test]
    fn test_new_transition_navigates_again() {
        let nav = RecordingNavigator::default();
        let mut guard = RouteGuard::new(GuardRequirement::default(), nav.clone());

        guard.observe(&AuthState::anonymous());
        guard.observe(&signed_in());
        guard.observe(&AuthState::anonymous());

        assert_eq!(nav.visits(), vec![(Route::Login, true), (Route::Login, true)]);
        assert_eq!(guard.last_decision(), Some(GuardDecision::Redirect(Route::Login)));
    }

    #[test]
    fn test_requirement_change_is_reevaluated() {
        let nav = RecordingNavigator::default();
        let mut guard = RouteGuard::new(GuardRequirement::default(), nav.clone());
        guard.observe(&AuthState::anonymous());

        guard.set_requirement(GuardRequirement {
            require_auth: true,
            redirect_to: Route::Register,
        });
        guard.observe(&AuthState::anonymous());

        assert_eq!(
            nav.visits(),
            vec![(Route::Login, true), (Route::Register, true)]
        );
    }

    #[tokio::test]
    async fn test_run_follows_state_changes() {
        let nav = RecordingNavigator::default();
        let guard = RouteGuard::new(GuardRequirement::default(), nav.clone());
        let (tx, rx) = watch::channel(AuthState::initial());

        let task = tokio::spawn(guard.run(rx));
        tx.send(AuthState::anonymous()).unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        drop(tx);
        task.await.unwrap();

        assert_eq!(nav.visits(), vec![(Route::Login, true)]);
    }
}
