//! Sign-in, registration and sign-out flows.

use std::sync::Arc;

use domains::validation::{SignInForm, SignUpForm};
use domains::{AuthProvider, Result, Session};
use tracing::{info, instrument};

use crate::session::SessionGate;

pub struct AccountService {
    provider: Arc<dyn AuthProvider>,
    gate: Arc<SessionGate>,
}

impl AccountService {
    pub fn new(provider: Arc<dyn AuthProvider>, gate: Arc<SessionGate>) -> Self {
        Self { provider, gate }
    }

    /// Activating the login screen always signs the current user out, so the
    /// screen is never shown over a stale session.
    pub async fn enter_login(&self) -> Result<()> {
        self.sign_out().await
    }

    /// Same forced sign-out as [`AccountService::enter_login`].
    pub async fn enter_registration(&self) -> Result<()> {
        self.sign_out().await
    }

    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn sign_in(&self, form: SignInForm) -> Result<Session> {
        form.validate()?;
        let session = self.provider.sign_in(&form.email, &form.password).await?;
        self.gate.apply(Some(session.clone()));
        info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    /// Creates the account, stores the display name on the profile and signs
    /// the new user in.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: SignUpForm) -> Result<Session> {
        form.validate()?;
        let created = self.provider.sign_up(&form.email, &form.password).await?;
        let session = self.provider.update_profile(&form.name).await?;
        self.gate.apply(Some(session.clone()));
        info!(uid = %created.uid, "account registered");
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.gate.apply(None);
        Ok(())
    }
}
