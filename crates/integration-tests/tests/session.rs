//! Account flows against the in-memory provider, and the session gate
//! following it.

mod common;

use std::sync::Arc;

use auth_adapters::InMemoryAuthProvider;
use domains::validation::{SignInForm, SignUpForm};
use domains::{AuthProvider, DomainError};
use services::{AccountService, AuthState, ListingRepository, SessionGate};
use storage_adapters::MemoryListingStore;

struct Accounts {
    provider: Arc<InMemoryAuthProvider>,
    gate: Arc<SessionGate>,
    service: AccountService,
}

fn accounts() -> Accounts {
    let provider = Arc::new(InMemoryAuthProvider::new());
    let gate = Arc::new(SessionGate::new());
    let service = AccountService::new(provider.clone(), gate.clone());
    Accounts {
        provider,
        gate,
        service,
    }
}

#[tokio::test]
async fn registration_signs_in_with_display_name() {
    let a = accounts();

    let session = a
        .service
        .register(SignUpForm::new("Marcos", "marcos@example.com", "123456"))
        .await
        .unwrap();

    assert_eq!(session.display_name.as_deref(), Some("Marcos"));
    assert_eq!(a.gate.require().unwrap(), session);
    assert_eq!(a.provider.current_session(), Some(session));
}

#[tokio::test]
async fn entering_login_or_registration_forces_sign_out() {
    let a = accounts();
    a.service
        .register(SignUpForm::new("Marcos", "marcos@example.com", "123456"))
        .await
        .unwrap();

    a.service.enter_login().await.unwrap();
    assert_eq!(a.gate.state(), AuthState::Unauthenticated);
    assert_eq!(a.provider.current_session(), None);

    a.service
        .sign_in(SignInForm::new("marcos@example.com", "123456"))
        .await
        .unwrap();
    assert!(a.gate.is_signed_in());

    a.service.enter_registration().await.unwrap();
    assert!(!a.gate.is_signed_in());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let a = accounts();
    a.service
        .register(SignUpForm::new("Marcos", "marcos@example.com", "123456"))
        .await
        .unwrap();
    a.service.sign_out().await.unwrap();

    let err = a
        .service
        .sign_in(SignInForm::new("marcos@example.com", "654321"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Unauthorized(_)));
    assert!(!a.gate.is_signed_in());
}

#[tokio::test]
async fn taken_email_is_a_conflict() {
    let a = accounts();
    a.service
        .register(SignUpForm::new("Marcos", "marcos@example.com", "123456"))
        .await
        .unwrap();

    let err = a
        .service
        .register(SignUpForm::new("Outro", "MARCOS@example.com", "abcdef"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn short_password_is_caught_before_the_provider() {
    let a = accounts();

    let err = a
        .service
        .register(SignUpForm::new("Marcos", "marcos@example.com", "123"))
        .await
        .unwrap_err();

    assert!(err.validation().unwrap().contains("password"));
    assert_eq!(a.provider.current_session(), None);
}

#[tokio::test]
async fn protected_operations_wait_for_the_session() {
    let gate = Arc::new(SessionGate::new());
    let listings = ListingRepository::new(Arc::new(MemoryListingStore::new()), gate.clone());

    assert!(gate.is_loading());
    assert!(matches!(
        listings.dashboard().await,
        Err(DomainError::Unauthorized(_))
    ));

    gate.apply(Some(common::seller()));
    assert!(listings.dashboard().await.unwrap().is_empty());
}

#[tokio::test]
async fn gate_follows_the_provider() {
    let provider = Arc::new(InMemoryAuthProvider::new());
    let gate = Arc::new(SessionGate::new());
    let mut states = gate.subscribe();

    let follower = {
        let gate = gate.clone();
        let updates = provider.subscribe();
        tokio::spawn(async move { gate.follow(updates).await })
    };

    states
        .wait_for(|s| *s == AuthState::Unauthenticated)
        .await
        .unwrap();

    let form = SignUpForm::new("Bia", "bia@example.com", "abcdef");
    provider.sign_up(&form.email, &form.password).await.unwrap();
    let state = states
        .wait_for(|s| matches!(s, AuthState::Authenticated(_)))
        .await
        .unwrap()
        .clone();
    assert_eq!(
        state.session().map(|s| s.email.as_str()),
        Some("bia@example.com")
    );

    provider.sign_out().await.unwrap();
    states
        .wait_for(|s| *s == AuthState::Unauthenticated)
        .await
        .unwrap();

    follower.abort();
}
