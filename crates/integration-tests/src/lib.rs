//! Integration tests for the Printshop client.
//!
//! The tests run the real [`ApiClient`], [`SessionStore`] and
//! [`ErrorInterceptor`] against [`MockBackend`], an in-process axum server
//! that speaks the backend's `{ success, data }` envelope.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p printshop-integration-tests
//! ```
//!
//! # Mock Endpoints
//!
//! - `POST /auth/login`, `POST /auth/register`, `GET /auth/me`
//! - `GET /photos` - requires a valid token
//! - `POST /photos/upload` - always rejects with 413
//! - `GET /orders/{id}` - 404 for unknown orders
//! - `POST /payments/create-payment-intent` - requires a valid token

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use printshop_client::{
    ApiClient, AuthService, ClientConfig, ErrorInterceptor, KeyValueStore, MemoryStore, Navigator,
    Notifier, Redirect, SessionStore,
};
use printshop_core::{
    AuthData, CreatePaymentIntentRequest, LoginRequest, RegisterRequest, User, UserId, UserRole,
};
use serde_json::json;
use tokio::task::JoinHandle;

/// Token key used by every test client.
pub const TOKEN_KEY: &str = "printshop_token";

pub const ADMIN_EMAIL: &str = "admin@printshop.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const CUSTOMER_EMAIL: &str = "jane@printshop.test";
pub const CUSTOMER_PASSWORD: &str = "jane-password";

// =============================================================================
// Mock backend
// =============================================================================

struct Account {
    user: User,
    password: String,
}

/// Mutable state behind the mock routes.
#[derive(Default)]
pub struct BackendState {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, User>>,
    /// Status forced onto every `/auth/me` response.
    me_override: Mutex<Option<StatusCode>>,
    next_id: AtomicU32,
}

impl BackendState {
    fn add_account(&self, email: &str, password: &str, role: UserRole, first_name: &str) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User {
            id: UserId::new(format!("user-{id}")),
            role,
            email: Some(email.to_string()),
            first_name: Some(first_name.to_string()),
            last_name: None,
        };
        self.accounts.lock().insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    fn issue_token(&self, user: &User) -> String {
        let token = format!("token-{}-{}", user.id, self.tokens.lock().len() + 1);
        self.tokens.lock().insert(token.clone(), user.clone());
        token
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<User> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.tokens.lock().get(token).cloned()
    }
}

/// An axum server on an ephemeral localhost port.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start the server with one admin and one standard account.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        state.add_account(ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin, "Ada");
        state.add_account(CUSTOMER_EMAIL, CUSTOMER_PASSWORD, UserRole::Standard, "Jane");

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/photos", get(photos))
            .route("/photos/upload", post(upload))
            .route("/orders/{id}", get(order))
            .route("/payments/create-payment-intent", post(create_payment_intent))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the mock API.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Invalidate every token issued so far.
    pub fn revoke_all_tokens(&self) {
        self.state.tokens.lock().clear();
    }

    /// Force `/auth/me` to answer with `status` (or restore normal handling).
    pub fn set_me_status(&self, status: Option<StatusCode>) {
        *self.state.me_override.lock() = status;
    }

    /// Build a client over fresh in-memory storage.
    pub fn client(&self) -> TestClient {
        self.client_with_storage(Arc::new(MemoryStore::new()))
    }

    /// Build a client over `storage`, simulating a page load.
    pub fn client_with_storage(&self, storage: Arc<dyn KeyValueStore>) -> TestClient {
        TestClient::connect(&self.url(), storage)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn ok(data: impl serde::Serialize) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn session_payload(state: &BackendState, user: &User) -> Response {
    ok(AuthData {
        token: Some(state.issue_token(user)),
        user: user.clone(),
    })
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginRequest>) -> Response {
    let user = state
        .accounts
        .lock()
        .get(&body.identifier.to_lowercase())
        .filter(|account| account.password == body.password)
        .map(|account| account.user.clone());

    match user {
        Some(user) => session_payload(&state, &user),
        None => fail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    if state.accounts.lock().contains_key(&body.email.to_lowercase()) {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "Email already in use");
    }

    let user = state.add_account(&body.email, &body.password, UserRole::Standard, &body.first_name);
    session_payload(&state, &user)
}

async fn me(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Some(status) = *state.me_override.lock() {
        return fail(status, "Forced failure");
    }

    match state.user_for(&headers) {
        Some(user) => ok(AuthData { token: None, user }),
        None => fail(StatusCode::UNAUTHORIZED, "Invalid token"),
    }
}

async fn photos(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    match state.user_for(&headers) {
        Some(_) => ok(json!([{ "id": "photo-1", "name": "beach.jpg" }])),
        None => fail(StatusCode::UNAUTHORIZED, "Token expired"),
    }
}

async fn upload() -> Response {
    fail(StatusCode::PAYLOAD_TOO_LARGE, "File too large")
}

async fn order(Path(id): Path<String>) -> Response {
    fail(StatusCode::NOT_FOUND, &format!("Order {id} not found"))
}

async fn create_payment_intent(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<CreatePaymentIntentRequest>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "Token expired");
    }
    if body.amount <= 0 {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "Amount must be positive");
    }

    ok(json!({
        "id": format!("pi_{}", body.order_id),
        "client_secret": format!("pi_{}_secret_test", body.order_id),
        "amount": body.amount,
        "currency": body.currency,
        "status": "requires_payment_method",
        "created": chrono::Utc::now().timestamp(),
    }))
}

// =============================================================================
// Client side
// =============================================================================

/// Captures what the interceptor showed and where it navigated.
#[derive(Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
    redirects: Mutex<Vec<Redirect>>,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn redirects(&self) -> Vec<Redirect> {
        self.redirects.lock().clone()
    }
}

impl Notifier for Recorder {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

impl Navigator for Recorder {
    fn navigate(&self, redirect: &Redirect) {
        self.redirects.lock().push(redirect.clone());
    }
}

/// A fully wired client, as one browser tab would hold it.
pub struct TestClient {
    pub session: SessionStore,
    pub api: ApiClient,
    pub auth: AuthService<ApiClient>,
    pub recorder: Arc<Recorder>,
}

impl TestClient {
    /// Wire a client for `api_url`, initializing the session from `storage`.
    pub fn connect(api_url: &str, storage: Arc<dyn KeyValueStore>) -> Self {
        let config = ClientConfig::for_api(api_url.parse().unwrap());
        let session = SessionStore::new(storage, TOKEN_KEY);
        session.initialize();

        let recorder = Arc::new(Recorder::default());
        let interceptor = ErrorInterceptor::new(
            session.clone(),
            Arc::clone(&recorder) as Arc<dyn Notifier>,
            Arc::clone(&recorder) as Arc<dyn Navigator>,
        );
        let api = ApiClient::new(&config, session.clone(), interceptor).unwrap();

        Self {
            auth: AuthService::new(api.clone(), session.clone()),
            api,
            session,
            recorder,
        }
    }

    /// Sign in as the seeded standard customer.
    pub async fn login_customer(&self) -> User {
        self.login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await
    }

    /// Sign in as the seeded admin.
    pub async fn login_admin(&self) -> User {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn login(&self, identifier: &str, password: &str) -> User {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        self.auth.login(&request).await.unwrap().user
    }
}

/// A base URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}
