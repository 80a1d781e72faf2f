//! # SessionGate
//!
//! Holds the authentication state and answers "who is calling?" for every
//! protected operation. The gate never talks to the provider itself; it is
//! fed provider results through [`SessionGate::apply`] or [`SessionGate::follow`].

use domains::{DomainError, Result, Session};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No provider callback has arrived yet.
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

pub struct SessionGate {
    state: watch::Sender<AuthState>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    /// Starts in [`AuthState::Loading`].
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { state }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Observe transitions (e.g. to redirect a private view once loading ends).
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Authenticated(_))
    }

    /// Provider callback: the current session, or its absence.
    pub fn apply(&self, session: Option<Session>) {
        let next = match session {
            Some(session) => {
                info!(uid = %session.uid, "session authenticated");
                AuthState::Authenticated(session)
            }
            None => {
                debug!("session cleared");
                AuthState::Unauthenticated
            }
        };
        self.state.send_replace(next);
    }

    /// The current session, or `Unauthorized` when loading or signed out.
    pub fn require(&self) -> Result<Session> {
        match &*self.state.borrow() {
            AuthState::Authenticated(session) => Ok(session.clone()),
            AuthState::Loading => Err(DomainError::unauthorized(
                "authentication state is still loading",
            )),
            AuthState::Unauthenticated => Err(DomainError::unauthorized("sign in required")),
        }
    }

    /// Applies the provider's current value, then every change, until the
    /// provider side goes away. Drop the future to stop following.
    pub async fn follow(&self, mut updates: watch::Receiver<Option<Session>>) {
        let current = updates.borrow_and_update().clone();
        self.apply(current);
        while updates.changed().await.is_ok() {
            let next = updates.borrow_and_update().clone();
            self.apply(next);
        }
        debug!("auth provider subscription closed");
    }
}
