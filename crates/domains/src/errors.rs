//! # DomainError
//!
//! Centralized error handling for the listing core.
//! Port adapters report [`StoreError`] / [`AuthError`]; services convert them
//! into [`DomainError`] before anything reaches a caller.

use std::fmt;

use thiserror::Error;

/// A single form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failing field of one submission, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing was pushed.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The primary error type for all core operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Bad or missing form fields. Raised before any network call.
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    /// Upload rejected before any network call.
    #[error("invalid media type {0:?}: only image/jpeg and image/png are accepted")]
    InvalidMediaType(String),

    /// No session, bad credentials, or not the owner.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Delete of a blob that is already absent. Non-fatal for callers.
    #[error("media not found at {0}")]
    MediaNotFound(String),

    /// Any store/provider call failed for transport, token or quota reasons.
    #[error("network error: {0}")]
    Network(String),

    /// Resource already exists (e.g., e-mail already registered)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    /// The validation detail, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Errors reported by record-store and blob-store adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport, quota or backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid object path: {0}")]
    InvalidPath(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        DomainError::Network(err.to_string())
    }
}

/// Errors reported by the authentication provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("authentication provider unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::NotSignedIn => {
                DomainError::Unauthorized(err.to_string())
            }
            AuthError::EmailInUse(_) => DomainError::Conflict(err.to_string()),
            AuthError::Unavailable(_) => DomainError::Network(err.to_string()),
        }
    }
}

/// A specialized Result type for core logic.
pub type Result<T> = std::result::Result<T, DomainError>;
