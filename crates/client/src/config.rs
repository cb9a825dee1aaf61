//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PRINTSHOP_API_URL` - Base URL of the REST backend (e.g. `https://api.example.com/api/`)
//!
//! ## Optional
//! - `PRINTSHOP_TOKEN_KEY` - Storage key for the token (default: `printshop_token`)
//! - `PRINTSHOP_STATE_DIR` - Directory for persisted session state (default: `.printshop`)
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key (`pk_test_...` / `pk_live_...`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_KEY: &str = "printshop_token";
const DEFAULT_STATE_DIR: &str = ".printshop";

/// Stripe key prefixes that must never ship to a client.
const SECRET_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];

/// Accepted publishable key prefixes.
const PUBLISHABLE_KEY_PREFIXES: &[&str] = &["pk_test_", "pk_live_"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub api_url: Url,
    /// Storage key for the token; the cached user lives under `<token_key>_user`
    pub token_key: String,
    /// Directory holding persisted session state
    pub state_dir: PathBuf,
    /// Stripe publishable key for the payment element
    pub stripe_publishable_key: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Configuration for `api_url` with every optional value defaulted.
    #[must_use]
    pub fn for_api(api_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            stripe_publishable_key: None,
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if a Stripe secret key was configured in place of a publishable one.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("PRINTSHOP_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("PRINTSHOP_API_URL".to_string()))?;
        let api_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PRINTSHOP_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "PRINTSHOP_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let token_key = lookup("PRINTSHOP_TOKEN_KEY")
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string());

        let state_dir = lookup("PRINTSHOP_STATE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

        let stripe_publishable_key = lookup("STRIPE_PUBLISHABLE_KEY")
            .map(|key| validate_publishable_key(&key, "STRIPE_PUBLISHABLE_KEY").map(|()| key))
            .transpose()?;

        Ok(Self {
            api_url: with_trailing_slash(api_url),
            token_key,
            state_dir,
            stripe_publishable_key,
            sentry_dsn: lookup("SENTRY_DSN"),
        })
    }

    /// File holding the persisted session.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Ensure relative endpoint paths join under the base path, not beside it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// A Stripe publishable key is safe to ship; secret and restricted keys are not.
fn validate_publishable_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    if SECRET_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "a Stripe secret key must never be configured on the client".to_string(),
        ));
    }

    if !PUBLISHABLE_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "expected a key starting with pk_test_ or pk_live_".to_string(),
        ));
    }

    Ok(())
}
