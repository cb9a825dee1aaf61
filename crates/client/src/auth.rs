//! Authentication service.
//!
//! Drives login, registration and token validation against an
//! [`AuthBackend`] and records the outcome in the [`SessionStore`].

use std::future::Future;

use printshop_core::{AuthData, AuthSession, LoginRequest, RegisterRequest, User};
use secrecy::SecretString;
use tracing::instrument;

use crate::error::ClientError;
use crate::session::SessionStore;

/// The three `/auth/*` exchanges the session lifecycle depends on.
///
/// [`ApiClient`](crate::ApiClient) implements this over HTTP.
pub trait AuthBackend: Send + Sync {
    /// `POST /auth/login`.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthData, ClientError>> + Send;

    /// `POST /auth/register`.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthData, ClientError>> + Send;

    /// `GET /auth/me` using `token`.
    fn current_user(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<AuthData, ClientError>> + Send;
}

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthService<B> {
    backend: B,
    session: SessionStore,
}

impl<B: AuthBackend> AuthService<B> {
    /// Create a service writing into `session`.
    #[must_use]
    pub const fn new(backend: B, session: SessionStore) -> Self {
        Self { backend, session }
    }

    /// The session this service writes into.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Log in with an identifier and password.
    ///
    /// On success the token and user are persisted together and the user is
    /// published. On failure the existing session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged, or `ClientError::Rejected` if
    /// the response carried no token.
    #[instrument(skip(self, request), fields(identifier = %request.identifier))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, ClientError> {
        let data = self.backend.login(request).await?;
        self.establish(data)
    }

    /// Create an account and sign in as it.
    ///
    /// Same contract as [`login`](Self::login); the returned user carries
    /// the newly issued ID.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged, or `ClientError::Rejected` if
    /// the response carried no token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession, ClientError> {
        let data = self.backend.register(request).await?;
        let session = self.establish(data)?;
        tracing::info!(user_id = %session.user.id, "Account registered");
        Ok(session)
    }

    /// Refresh the published user from `/auth/me`.
    ///
    /// Never clears the token, whatever the failure.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` without contacting the
    /// backend when no token is held, or when the session was signed out or
    /// replaced while the request was in flight; otherwise the backend
    /// failure.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> Result<User, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        let data = self.backend.current_user(&token).await?;
        if !self.session.replace_user(&token, &data.user)? {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(data.user)
    }

    /// Best-effort check that the held token is still accepted.
    ///
    /// Only an explicit rejection (401/403) clears the session and returns
    /// `false`. Anything else - the backend being down, the network being
    /// unreachable - is inconclusive: the session stays and this returns
    /// `true`.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> bool {
        if self.session.token().is_none() {
            return false;
        }

        match self.fetch_current_user().await {
            Ok(_) => true,
            // Signed out or replaced mid-flight; report the current state.
            Err(ClientError::NotAuthenticated) => self.session.is_authenticated(),
            Err(e) if e.is_authoritative_rejection() => {
                tracing::info!(error = %e, "Token rejected; clearing session");
                self.session.logout();
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token validation inconclusive; keeping session");
                true
            }
        }
    }

    /// Sign out locally.
    pub fn logout(&self) {
        self.session.logout();
    }

    fn establish(&self, data: AuthData) -> Result<AuthSession, ClientError> {
        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Rejected("response did not include a token".to_string()))?;

        self.session.establish(&token, &data.user)?;

        Ok(AuthSession {
            token,
            user: data.user,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use printshop_core::{UserId, UserRole};
    use reqwest::StatusCode;
    use secrecy::ExposeSecret;
    use tokio::sync::Notify;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    const KEY: &str = "printshop_token";

    /// Backend answering from a queue of canned results.
    #[derive(Default)]
    struct FakeBackend {
        responses: Mutex<VecDeque<Result<AuthData, ClientError>>>,
        seen_tokens: Mutex<Vec<String>>,
        calls: Mutex<usize>,
        /// When set, `current_user` waits here before answering.
        gate: Option<Arc<Notify>>,
        in_flight: Notify,
    }

    impl FakeBackend {
        fn push(&self, response: Result<AuthData, ClientError>) {
            self.responses.lock().push_back(response);
        }

        fn next(&self) -> Result<AuthData, ClientError> {
            *self.calls.lock() += 1;
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Err(ClientError::NotAuthenticated))
        }
    }

    impl AuthBackend for Arc<FakeBackend> {
        async fn login(&self, _request: &LoginRequest) -> Result<AuthData, ClientError> {
            self.next()
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<AuthData, ClientError> {
            self.next()
        }

        async fn current_user(&self, token: &SecretString) -> Result<AuthData, ClientError> {
            self.seen_tokens.lock().push(token.expose_secret().to_string());
            if let Some(gate) = &self.gate {
                self.in_flight.notify_one();
                gate.notified().await;
            }
            self.next()
        }
    }

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: UserId::new(id),
            role,
            email: Some(format!("{id}@example.com")),
            first_name: Some("Pat".to_string()),
            last_name: Some("Doe".to_string()),
        }
    }

    fn data(token: Option<&str>, user: User) -> AuthData {
        AuthData {
            token: token.map(str::to_string),
            user,
        }
    }

    fn status(code: StatusCode) -> ClientError {
        ClientError::Status {
            status: code,
            path: "/auth/me".to_string(),
            detail: None,
        }
    }

    fn service() -> (AuthService<Arc<FakeBackend>>, Arc<FakeBackend>, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionStore::new(storage.clone(), KEY);
        session.initialize();
        let backend = Arc::new(FakeBackend::default());
        (AuthService::new(backend.clone(), session), backend, storage)
    }

    fn login_request() -> LoginRequest {
        LoginRequest {
            identifier: "pat@example.com".to_string(),
            password: "secret-pass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let (auth, backend, storage) = service();
        let expected = user("u1", UserRole::Standard);
        backend.push(Ok(data(Some("jwt-1"), expected.clone())));

        let session = auth.login(&login_request()).await.unwrap();

        assert_eq!(session.token, "jwt-1");
        assert_eq!(session.user, expected);
        assert!(auth.session().is_authenticated());
        assert_eq!(auth.session().current_user(), Some(expected));
        assert_eq!(storage.get(KEY).unwrap().as_deref(), Some("jwt-1"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_prior_session() {
        let (auth, backend, _) = service();
        let existing = user("u1", UserRole::Standard);
        backend.push(Ok(data(Some("jwt-1"), existing.clone())));
        auth.login(&login_request()).await.unwrap();

        backend.push(Err(ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            path: "/auth/login".to_string(),
            detail: None,
        }));
        let err = auth.login(&login_request()).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(auth.session().current_user(), Some(existing));
        assert_eq!(
            auth.session().token().unwrap().expose_secret(),
            "jwt-1"
        );
    }

    #[tokio::test]
    async fn test_login_without_token_is_rejected() {
        let (auth, backend, storage) = service();
        backend.push(Ok(data(None, user("u1", UserRole::Standard))));

        let err = auth.login(&login_request()).await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(_)));
        assert!(!auth.session().is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_register_returns_new_user_id() {
        let (auth, backend, _) = service();
        backend.push(Ok(data(Some("jwt-new"), user("new-42", UserRole::Standard))));

        let session = auth
            .register(&RegisterRequest {
                first_name: "Pat".to_string(),
                last_name: "Doe".to_string(),
                email: "pat@example.com".to_string(),
                password: "secret-pass".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id.as_str(), "new-42");
        assert!(auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_fetch_current_user_requires_token() {
        let (auth, backend, _) = service();
        let err = auth.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(*backend.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_fetch_current_user_overwrites_published_user() {
        let (auth, backend, _) = service();
        backend.push(Ok(data(Some("jwt-1"), user("u1", UserRole::Standard))));
        auth.login(&login_request()).await.unwrap();

        let promoted = user("u1", UserRole::Admin);
        backend.push(Ok(data(None, promoted.clone())));
        let fetched = auth.fetch_current_user().await.unwrap();

        assert_eq!(fetched, promoted);
        assert!(auth.session().is_admin());
        assert_eq!(*backend.seen_tokens.lock(), vec!["jwt-1".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_current_user_failure_keeps_token() {
        let (auth, backend, _) = service();
        backend.push(Ok(data(Some("jwt-1"), user("u1", UserRole::Standard))));
        auth.login(&login_request()).await.unwrap();

        backend.push(Err(status(StatusCode::UNAUTHORIZED)));
        assert!(auth.fetch_current_user().await.is_err());
        assert!(auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_validate_token_clears_on_401() {
        let (auth, backend, storage) = service();
        backend.push(Ok(data(Some("jwt-1"), user("u1", UserRole::Standard))));
        auth.login(&login_request()).await.unwrap();

        backend.push(Err(status(StatusCode::UNAUTHORIZED)));
        assert!(!auth.validate_token().await);

        assert!(!auth.session().is_authenticated());
        assert!(auth.session().current_user().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_validate_token_clears_on_403() {
        let (auth, backend, _) = service();
        backend.push(Ok(data(Some("jwt-1"), user("u1", UserRole::Standard))));
        auth.login(&login_request()).await.unwrap();

        backend.push(Err(status(StatusCode::FORBIDDEN)));
        assert!(!auth.validate_token().await);
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_validate_token_fails_open_on_server_error() {
        let (auth, backend, _) = service();
        let existing = user("u1", UserRole::Standard);
        backend.push(Ok(data(Some("jwt-1"), existing.clone())));
        auth.login(&login_request()).await.unwrap();

        backend.push(Err(status(StatusCode::INTERNAL_SERVER_ERROR)));
        assert!(auth.validate_token().await);
        assert!(auth.session().is_authenticated());
        assert_eq!(auth.session().current_user(), Some(existing));
    }

    #[tokio::test]
    async fn test_validate_token_without_token() {
        let (auth, backend, _) = service();
        assert!(!auth.validate_token().await);
        assert_eq!(*backend.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_logout_during_fetch_discards_fetched_user() {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionStore::new(storage.clone(), KEY);
        session.initialize();
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend {
            gate: Some(gate.clone()),
            ..FakeBackend::default()
        });
        let auth = Arc::new(AuthService::new(backend.clone(), session.clone()));

        session.establish("jwt-1", &user("u1", UserRole::Standard)).unwrap();
        backend.push(Ok(data(None, user("u1", UserRole::Admin))));

        let fetch = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.fetch_current_user().await })
        };
        backend.in_flight.notified().await;
        session.logout();
        gate.notify_one();

        let result = fetch.await.unwrap();

        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert!(session.token().is_none());
        assert!(session.current_user().is_none());
        assert!(!session.is_admin());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_validate_token_after_concurrent_logout_is_false() {
        let session = SessionStore::new(Arc::new(MemoryStore::new()), KEY);
        session.initialize();
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend {
            gate: Some(gate.clone()),
            ..FakeBackend::default()
        });
        let auth = Arc::new(AuthService::new(backend.clone(), session.clone()));

        session.establish("jwt-1", &user("u1", UserRole::Standard)).unwrap();
        backend.push(Ok(data(None, user("u1", UserRole::Standard))));

        let validate = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.validate_token().await })
        };
        backend.in_flight.notified().await;
        session.logout();
        gate.notify_one();

        assert!(!validate.await.unwrap());
        assert!(session.current_user().is_none());
    }
}
