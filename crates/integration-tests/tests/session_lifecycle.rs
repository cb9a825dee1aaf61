//! Login, registration, persistence and token validation against the mock
//! backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use printshop_client::forms::RegisterForm;
use printshop_client::{ClientError, FileStore, KeyValueStore, MemoryStore};
use printshop_core::{LoginRequest, UserRole};
use printshop_integration_tests::{
    CUSTOMER_EMAIL, MockBackend, TOKEN_KEY, TestClient, closed_port_url,
};
use reqwest::StatusCode;

// ============================================================================
// Login & Registration
// ============================================================================

#[tokio::test]
async fn test_login_persists_token_and_user() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStore::new());
    let client = backend.client_with_storage(storage.clone());

    let user = client.login_customer().await;

    assert!(client.session.is_authenticated());
    assert!(!client.session.is_admin());
    assert_eq!(client.session.current_user(), Some(user.clone()));

    let token = storage.get(TOKEN_KEY).unwrap().unwrap();
    assert!(token.starts_with("token-"));
    let cached: printshop_core::User =
        serde_json::from_str(&storage.get("printshop_token_user").unwrap().unwrap()).unwrap();
    assert_eq!(cached, user);
}

#[tokio::test]
async fn test_login_publishes_to_subscribers() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let mut updates = client.session.subscribe();

    assert_eq!(updates.next().await, Some(None));

    let user = client.login_customer().await;
    assert_eq!(updates.try_next(), Some(Some(user)));

    client.auth.logout();
    assert_eq!(updates.try_next(), Some(None));
    assert_eq!(updates.try_next(), None);
}

#[tokio::test]
async fn test_wrong_password_leaves_session_untouched() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let user = client.login_customer().await;

    let err = client
        .auth
        .login(&LoginRequest {
            identifier: CUSTOMER_EMAIL.to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    // Credential rejection is shown inline by the form, not by the interceptor.
    assert!(client.recorder.messages().is_empty());
    assert!(client.recorder.redirects().is_empty());
    assert!(client.session.is_authenticated());
    assert_eq!(client.session.current_user(), Some(user));
}

#[tokio::test]
async fn test_register_signs_in_new_account() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let request = RegisterForm {
        first_name: "Sam".to_string(),
        last_name: "Lee".to_string(),
        email: "Sam@Example.com".to_string(),
        password: "long enough".to_string(),
        confirm_password: "long enough".to_string(),
    }
    .validate()
    .unwrap();

    let session = client.auth.register(&request).await.unwrap();

    assert_eq!(session.user.role, UserRole::Standard);
    assert_eq!(session.user.email.as_deref(), Some("Sam@example.com"));
    assert!(client.session.is_authenticated());
}

#[tokio::test]
async fn test_register_duplicate_email_surfaces_backend_detail() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let request = RegisterForm {
        first_name: "Jane".to_string(),
        last_name: "Again".to_string(),
        email: CUSTOMER_EMAIL.to_string(),
        password: "long enough".to_string(),
        confirm_password: "long enough".to_string(),
    }
    .validate()
    .unwrap();

    let err = client.auth.register(&request).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert_eq!(client.recorder.messages(), vec!["Email already in use"]);
    assert!(!client.session.is_authenticated());
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("session.json");

    let user = backend
        .client_with_storage(Arc::new(FileStore::new(&path)))
        .login_admin()
        .await;

    let reloaded = backend.client_with_storage(Arc::new(FileStore::new(&path)));
    assert!(reloaded.session.is_authenticated());
    assert!(reloaded.session.is_admin());
    assert_eq!(reloaded.session.current_user(), Some(user));
}

#[tokio::test]
async fn test_corrupt_cached_user_is_discarded() {
    let backend = MockBackend::start().await;
    let storage = Arc::new(MemoryStore::with_entries([
        (TOKEN_KEY, "token-user-2-1"),
        ("printshop_token_user", "{not json"),
    ]));

    let client = backend.client_with_storage(storage);

    assert!(client.session.is_initialized());
    assert!(client.session.current_user().is_none());
}

// ============================================================================
// Token Validation
// ============================================================================

#[tokio::test]
async fn test_validate_token_refreshes_user() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let user = client.login_customer().await;

    assert!(client.auth.validate_token().await);
    assert_eq!(client.session.current_user(), Some(user));
}

#[tokio::test]
async fn test_validate_token_without_token_is_false() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    assert!(!client.auth.validate_token().await);
    assert!(matches!(
        client.auth.fetch_current_user().await,
        Err(ClientError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_revoked_token_clears_session() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    backend.revoke_all_tokens();

    assert!(!client.auth.validate_token().await);
    assert!(!client.session.is_authenticated());
    assert!(client.session.current_user().is_none());
    assert!(client.session.token().is_none());
}

#[tokio::test]
async fn test_forbidden_token_clears_session() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    backend.set_me_status(Some(StatusCode::FORBIDDEN));

    assert!(!client.auth.validate_token().await);
    assert!(!client.session.is_authenticated());
}

#[tokio::test]
async fn test_backend_fault_keeps_session() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let user = client.login_customer().await;

    backend.set_me_status(Some(StatusCode::INTERNAL_SERVER_ERROR));

    assert!(client.auth.validate_token().await);
    assert!(client.session.is_authenticated());
    assert_eq!(client.session.current_user(), Some(user));
}

#[tokio::test]
async fn test_unreachable_backend_keeps_session() {
    let backend = MockBackend::start().await;
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let user = backend
        .client_with_storage(Arc::clone(&storage))
        .login_customer()
        .await;

    let offline = TestClient::connect(&closed_port_url(), storage);

    assert!(offline.auth.validate_token().await);
    assert!(offline.session.is_authenticated());
    assert_eq!(offline.session.current_user(), Some(user));
    assert_eq!(
        offline.recorder.messages(),
        vec![printshop_client::interceptor::messages::NETWORK]
    );
}
