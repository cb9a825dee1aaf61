//! Printshop Client - session lifecycle for the photo-printing storefront.
//!
//! # Architecture
//!
//! One [`SessionStore`] is constructed per process and handed (by cheap
//! clone) to everything that needs to know who is signed in:
//!
//! - [`AuthService`] performs login, registration and token validation
//!   against an [`AuthBackend`] and writes the outcome into the store
//! - [`guard::AuthGuard`] and [`guard::AdminGuard`] decide whether a
//!   navigation may proceed
//! - [`ErrorInterceptor`] classifies failed HTTP exchanges and invalidates
//!   the store when the backend reports an expired session
//! - [`ApiClient`] is the reqwest-backed [`AuthBackend`] that routes every
//!   failure through the interceptor
//!
//! Persistence goes through the [`KeyValueStore`] trait so the same logic
//! runs over browser-like storage, a JSON file, or memory in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use printshop_client::{ApiClient, AuthService, ClientConfig, ErrorInterceptor, SessionStore};
//!
//! let config = ClientConfig::from_env()?;
//! let session = SessionStore::new(storage, &config.token_key);
//! session.initialize();
//!
//! let interceptor = ErrorInterceptor::new(session.clone(), notifier, navigator);
//! let api = ApiClient::new(&config, session.clone(), interceptor)?;
//! let auth = AuthService::new(api, session.clone());
//!
//! let signed_in = auth.login(&form.validate()?).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod guard;
pub mod http;
pub mod interceptor;
pub mod routes;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use auth::{AuthBackend, AuthService};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use guard::{AdminGuard, AuthGuard, GuardOutcome, Redirect};
pub use http::ApiClient;
pub use interceptor::{ErrorInterceptor, FailureKind, HttpFailure, Interception, Navigator, Notifier};
pub use session::{SessionSnapshot, SessionStore, UserSubscription};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
