//! Component-level route guard.
//!
//! Re-checks the session and role after the page has loaded, covering what
//! the edge layer cannot see (a token that expired after the page was
//! served, a profile whose role changed). Each evaluation starts in
//! `Checking` and ends either in a terminal phase or in a navigation that
//! unmounts the guard.

use std::time::Duration;

use crate::models::Role;
use crate::services::policy;
use crate::services::session_store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Checking,
    Allowed,
    Denied,
}

/// What to render when access is denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// Built-in access-denied view
    AccessDenied,
    Custom(String),
}

/// What the guarded page renders for a given outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    Loading,
    AccessDenied(Fallback),
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    pub phase: GuardPhase,
    /// Navigation requested by the guard, if any
    pub navigate_to: Option<String>,
}

impl GuardOutcome {
    fn navigate(to: String) -> Self {
        Self {
            phase: GuardPhase::Checking,
            navigate_to: Some(to),
        }
    }

    fn settled(phase: GuardPhase) -> Self {
        Self {
            phase,
            navigate_to: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    pub required_roles: Vec<Role>,
    pub redirect_to: Option<String>,
    pub fallback: Option<String>,
    pub settle_delay: Duration,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard for the role-restricted part of the route table covering `path`
    pub fn for_path(path: &str) -> Self {
        Self {
            required_roles: policy::classify(path).required_roles().to_vec(),
            ..Self::default()
        }
    }

    pub fn require_roles(mut self, roles: &[Role]) -> Self {
        self.required_roles = roles.to_vec();
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    pub fn fallback(mut self, view: impl Into<String>) -> Self {
        self.fallback = Some(view.into());
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run one access check for `path`
    pub fn evaluate(&self, store: &SessionStore, path: &str) -> GuardOutcome {
        if !store.is_authenticated() {
            tracing::debug!(path, "route guard: not authenticated");
            return GuardOutcome::navigate(policy::login_redirect(path));
        }

        if !self.required_roles.is_empty() {
            let Some(profile) = store.profile() else {
                tracing::debug!(path, "route guard: no stored profile");
                return GuardOutcome::navigate(policy::LOGIN_PATH.to_string());
            };

            if !policy::is_allowed(profile.role, &self.required_roles) {
                tracing::info!(
                    path,
                    role = %profile.role,
                    required = ?self.required_roles,
                    "route guard: role not allowed"
                );
                return match &self.redirect_to {
                    Some(target) => GuardOutcome::navigate(target.clone()),
                    None => GuardOutcome::settled(GuardPhase::Denied),
                };
            }
        }

        GuardOutcome::settled(GuardPhase::Allowed)
    }

    /// Waits out the settle delay, then checks.
    ///
    /// Dropping the future before it completes cancels the pending check.
    pub async fn run(&self, store: &SessionStore, path: &str) -> GuardOutcome {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        self.evaluate(store, path)
    }

    pub fn render(&self, outcome: &GuardOutcome) -> GuardView {
        match outcome.phase {
            GuardPhase::Checking => GuardView::Loading,
            GuardPhase::Allowed => GuardView::Content,
            GuardPhase::Denied => GuardView::AccessDenied(match &self.fallback {
                Some(custom) => Fallback::Custom(custom.clone()),
                None => Fallback::AccessDenied,
            }),
        }
    }
}
