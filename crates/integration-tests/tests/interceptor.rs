//! Failure handling of requests made through the API client.

#![allow(clippy::unwrap_used)]

use printshop_client::interceptor::messages;
use printshop_client::{AuthGuard, GuardOutcome, Redirect};
use printshop_integration_tests::MockBackend;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_authorized_request_succeeds() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    let photos: Vec<Value> = client.api.get("/photos").await.unwrap();

    assert_eq!(photos.len(), 1);
    assert!(client.recorder.messages().is_empty());
}

#[tokio::test]
async fn test_expired_session_clears_and_redirects() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;
    let mut updates = client.session.subscribe();
    updates.try_next();

    backend.revoke_all_tokens();
    let err = client.api.get::<Vec<Value>>("/photos").await.unwrap_err();

    // The caller still receives the original failure.
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(!client.session.is_authenticated());
    assert!(client.session.token().is_none());
    assert_eq!(updates.try_next(), Some(None));
    assert_eq!(client.recorder.redirects(), vec![Redirect::login(None)]);
    assert_eq!(client.recorder.messages(), vec![messages::SESSION_EXPIRED]);

    // The next navigation is gated again.
    let outcome = AuthGuard::check(&client.session, "/orders").await;
    assert_eq!(
        outcome,
        GuardOutcome::Redirect(Redirect::login(Some("/orders")))
    );
}

#[tokio::test]
async fn test_unauthenticated_request_to_protected_endpoint() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client.api.get::<Vec<Value>>("/photos").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(client.recorder.redirects(), vec![Redirect::login(None)]);
}

#[tokio::test]
async fn test_payload_too_large_keeps_session() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    let err = client
        .api
        .post::<_, Value>("/photos/upload", &serde_json::json!({ "name": "huge.tiff" }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::PAYLOAD_TOO_LARGE));
    assert!(client.session.is_authenticated());
    let messages = client.recorder.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("50 MB"));
    assert!(client.recorder.redirects().is_empty());
}

#[tokio::test]
async fn test_not_found_shows_fixed_message() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    let err = client.api.get::<Value>("/orders/missing").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(client.recorder.messages(), vec![messages::NOT_FOUND]);
    assert!(client.session.is_authenticated());
}
