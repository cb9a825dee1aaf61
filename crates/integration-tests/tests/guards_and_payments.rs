//! Route guards over real sessions, and payment intent creation.

#![allow(clippy::unwrap_used)]

use printshop_client::{AdminGuard, AuthGuard, GuardOutcome, Redirect, routes};
use printshop_core::{CreatePaymentIntentRequest, Currency, OrderId, PaymentIntentStatus};
use printshop_integration_tests::MockBackend;
use reqwest::StatusCode;

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_signed_out_navigation_redirects_with_return_url() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let outcome = AuthGuard::check(&client.session, "/orders/42").await;
    let GuardOutcome::Redirect(redirect) = outcome else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.to_url(), "/auth/login?returnUrl=%2Forders%2F42");

    assert_eq!(
        AdminGuard::check(&client.session).await,
        GuardOutcome::Redirect(Redirect::login(None))
    );
}

#[tokio::test]
async fn test_customer_is_kept_out_of_admin_area() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let user = client.login_customer().await;

    assert!(AuthGuard::check(&client.session, "/orders").await.is_allowed());
    assert_eq!(
        AdminGuard::check(&client.session).await,
        GuardOutcome::Redirect(Redirect::home())
    );
    // Being redirected home does not cost the customer their session.
    assert!(client.session.is_authenticated());
    assert_eq!(
        routes::post_login_destination(&user, Some("/orders/42")),
        "/orders/42"
    );
}

#[tokio::test]
async fn test_admin_enters_admin_area() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let user = client.login_admin().await;

    assert!(AdminGuard::check(&client.session).await.is_allowed());
    assert_eq!(
        routes::post_login_destination(&user, Some("/orders/42")),
        routes::ADMIN_HOME
    );
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_create_payment_intent() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    let intent = client
        .api
        .create_payment_intent(&CreatePaymentIntentRequest {
            order_id: OrderId::new("order-7"),
            amount: 1999,
            currency: Currency::Usd,
        })
        .await
        .unwrap();

    assert_eq!(intent.id.as_str(), "pi_order-7");
    assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
    assert_eq!(intent.money().display(), "$19.99");
    assert!(!format!("{intent:?}").contains("secret_test"));
}

#[tokio::test]
async fn test_create_payment_intent_rejects_invalid_amount() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login_customer().await;

    let err = client
        .api
        .create_payment_intent(&CreatePaymentIntentRequest {
            order_id: OrderId::new("order-8"),
            amount: 0,
            currency: Currency::Usd,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert_eq!(client.recorder.messages(), vec!["Amount must be positive"]);
}
