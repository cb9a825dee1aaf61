//! REST API client.
//!
//! Every exchange goes through [`ApiClient::send`], which attaches the bearer
//! token, unwraps the `{ success, data }` envelope, and hands any failed
//! exchange to the [`ErrorInterceptor`] before returning the original error.

use std::sync::Arc;

use printshop_core::{
    ApiEnvelope, AuthData, CreatePaymentIntentRequest, LoginRequest, PaymentIntent,
    RegisterRequest,
};
use reqwest::Method;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::auth::AuthBackend;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::interceptor::{ErrorInterceptor, HttpFailure};
use crate::session::SessionStore;

const USER_AGENT: &str = concat!("printshop-client/", env!("CARGO_PKG_VERSION"));

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const ME: &str = "/auth/me";
    pub const CREATE_PAYMENT_INTENT: &str = "/payments/create-payment-intent";
}

/// Client for the Printshop REST backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    interceptor: ErrorInterceptor,
}

impl ApiClient {
    /// Create a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        interceptor: ErrorInterceptor,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            session,
            interceptor,
        ))
    }

    /// Create a client over an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        base_url: Url,
        session: SessionStore,
        interceptor: ErrorInterceptor,
    ) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                session,
                interceptor,
            }),
        }
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Generic requests
    // =========================================================================

    /// `GET path` with the session token.
    ///
    /// # Errors
    ///
    /// Returns the (already intercepted) failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let token = self.inner.session.token();
        self.send(Method::GET, path, None, token.as_ref()).await
    }

    /// `POST path` with a JSON body and the session token.
    ///
    /// # Errors
    ///
    /// Returns the (already intercepted) failure.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let token = self.inner.session.token();
        self.send(Method::POST, path, Some(body), token.as_ref()).await
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Ask the backend to open a Stripe payment intent for an order.
    ///
    /// # Errors
    ///
    /// Returns the (already intercepted) failure.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, ClientError> {
        self.post(endpoints::CREATE_PAYMENT_INTENT, request).await
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Perform one exchange; on failure, intercept and re-raise.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let result = self.exchange(method.clone(), path, body, token).await;

        if let Err(error) = &result
            && let Some(failure) = HttpFailure::from_error(method.as_str(), path, error)
        {
            self.inner.interceptor.handle(&failure);
        }

        result
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.detail().map(str::to_string));
            return Err(ClientError::Status {
                status,
                path: path.to_string(),
                detail,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&text)?;
        if !envelope.success {
            return Err(ClientError::Rejected(
                envelope
                    .detail()
                    .unwrap_or("request was not successful")
                    .to_string(),
            ));
        }

        envelope
            .data
            .ok_or_else(|| ClientError::Rejected("response contained no data".to_string()))
    }
}

impl AuthBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthData, ClientError> {
        let body = serde_json::to_value(request)?;
        self.send(Method::POST, endpoints::LOGIN, Some(body), None)
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthData, ClientError> {
        let body = serde_json::to_value(request)?;
        self.send(Method::POST, endpoints::REGISTER, Some(body), None)
            .await
    }

    async fn current_user(&self, token: &SecretString) -> Result<AuthData, ClientError> {
        self.send(Method::GET, endpoints::ME, None, Some(token)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
