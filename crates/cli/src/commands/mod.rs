//! CLI command implementations.

use std::sync::Arc;

use printshop_client::forms::FormErrors;
use printshop_client::{
    ApiClient, AuthService, ClientConfig, ClientError, ErrorInterceptor, FileStore, Redirect,
    SessionStore,
};
use thiserror::Error;

pub mod auth;
pub mod route;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid input: {0}")]
    Form(#[from] FormErrors),

    #[error("Not signed in")]
    SignedOut,

    #[error("Navigation denied, redirect to {0}")]
    Denied(Redirect),
}

/// Everything a command needs, wired around one persisted session.
pub struct Context {
    pub session: SessionStore,
    pub auth: AuthService<ApiClient>,
}

impl Context {
    /// Open the session file and build the API client around it.
    pub fn open(config: &ClientConfig) -> Result<Self, CommandError> {
        let storage = Arc::new(FileStore::new(config.session_file()));
        let session = SessionStore::new(storage, &config.token_key);
        session.initialize();

        let interceptor = ErrorInterceptor::logging(session.clone());
        let api = ApiClient::new(config, session.clone(), interceptor)?;

        Ok(Self {
            auth: AuthService::new(api, session.clone()),
            session,
        })
    }
}
