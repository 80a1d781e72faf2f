//! # In-memory auth provider
//!
//! Argon2-based implementation of `AuthProvider`. Accounts live in memory;
//! the signed-in session is published on a `watch` channel so a
//! `SessionGate` can follow it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{AuthError, AuthProvider, Session};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

struct Account {
    uid: String,
    email: String,
    display_name: Option<String>,
    /// PHC string produced by Argon2.
    password_hash: String,
}

impl Account {
    fn session(&self) -> Session {
        Session {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

pub struct InMemoryAuthProvider {
    /// Keyed by normalized (trimmed, lower-cased) e-mail.
    accounts: DashMap<String, Account>,
    current: watch::Sender<Option<Session>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Unavailable(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

impl InMemoryAuthProvider {
    /// Starts with no accounts and nobody signed in.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            current,
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    fn publish(&self, session: Option<Session>) {
        self.current.send_replace(session);
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        let session = {
            let account = self
                .accounts
                .get(&normalize(email))
                .ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(password.expose_secret(), &account.password_hash) {
                return Err(AuthError::InvalidCredentials);
            }
            account.session()
        };
        info!(uid = %session.uid, "provider sign-in");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        let key = normalize(email);
        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse(key));
        }
        let password_hash = hash_password(password.expose_secret())?;

        let session = match self.accounts.entry(key.clone()) {
            Entry::Occupied(_) => return Err(AuthError::EmailInUse(key)),
            Entry::Vacant(slot) => {
                let account = Account {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: key,
                    display_name: None,
                    password_hash,
                };
                let session = account.session();
                slot.insert(account);
                session
            }
        };
        info!(uid = %session.uid, "provider account created");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn update_profile(&self, display_name: &str) -> Result<Session, AuthError> {
        let current = self.current_session().ok_or(AuthError::NotSignedIn)?;
        let session = {
            let mut account = self
                .accounts
                .get_mut(&current.email)
                .ok_or(AuthError::NotSignedIn)?;
            account.display_name = Some(display_name.to_string());
            account.session()
        };
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("provider sign-out");
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}
