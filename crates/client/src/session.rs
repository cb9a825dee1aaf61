//! Session store: the single source of truth for "is someone signed in, and
//! who".
//!
//! # State
//!
//! - the bearer token, persisted under `<token_key>`
//! - a cached copy of the user, persisted under `<token_key>_user` and
//!   published to subscribers
//! - an `initialized` flag that flips to `true` exactly once
//!
//! The cached user is advisory: it lets the UI render a name right after a
//! reload, before `/auth/me` has confirmed anything. It is never treated as
//! proof that the token is valid.
//!
//! # Publication
//!
//! Every state change happens inside one write-locked critical section that
//! also publishes to the broadcast channel, and [`SessionStore::subscribe`]
//! snapshots the current user under the same lock. A subscriber therefore
//! sees the latest value first and then every later change, in order.

use std::sync::Arc;

use parking_lot::RwLock;
use printshop_core::User;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, watch};

use crate::error::ClientError;
use crate::storage::KeyValueStore;
use crate::telemetry;

/// Buffered updates per subscriber before it starts lagging.
const UPDATE_CAPACITY: usize = 64;

/// Suffix appended to the token key for the cached user record.
const USER_KEY_SUFFIX: &str = "_user";

/// Handle to the process-wide session.
///
/// Cloning is cheap and every clone refers to the same session. Construct
/// exactly one per process and pass clones to guards, the interceptor and
/// the auth service.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn KeyValueStore>,
    token_key: String,
    user_key: String,
    state: RwLock<SessionState>,
    updates: broadcast::Sender<Option<User>>,
    ready: watch::Sender<bool>,
}

#[derive(Default)]
struct SessionState {
    user: Option<User>,
    initialized: bool,
}

/// Point-in-time view used by the route guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub initialized: bool,
    pub authenticated: bool,
    pub admin: bool,
}

impl SessionSnapshot {
    /// No session at all.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            initialized: true,
            authenticated: false,
            admin: false,
        }
    }

    /// Signed in as a regular user.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            initialized: true,
            authenticated: true,
            admin: false,
        }
    }

    /// Signed in as an administrator.
    #[must_use]
    pub const fn admin() -> Self {
        Self {
            initialized: true,
            authenticated: true,
            admin: true,
        }
    }
}

impl SessionStore {
    /// Create an uninitialized store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, token_key: &str) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let (ready, _) = watch::channel(false);

        Self {
            inner: Arc::new(SessionInner {
                storage,
                token_key: token_key.to_owned(),
                user_key: format!("{token_key}{USER_KEY_SUFFIX}"),
                state: RwLock::new(SessionState::default()),
                updates,
                ready,
            }),
        }
    }

    /// Storage key holding the raw token.
    #[must_use]
    pub fn token_key(&self) -> &str {
        &self.inner.token_key
    }

    /// Storage key holding the cached user record.
    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.inner.user_key
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Hydrate the session from storage without touching the network.
    ///
    /// If a token is persisted, the cached user (if any) is published as the
    /// current user. Runs once; later calls are no-ops.
    pub fn initialize(&self) {
        let mut state = self.inner.state.write();
        if state.initialized {
            return;
        }

        if self.read_token().is_some() {
            if let Some(user) = self.read_cached_user() {
                tracing::debug!(user_id = %user.id, "Restored cached user");
                state.user = Some(user.clone());
                let _ = self.inner.updates.send(Some(user));
            }
        } else {
            tracing::debug!("No persisted token; starting signed out");
        }

        state.initialized = true;
        self.inner.ready.send_replace(true);
    }

    /// Resolve once [`initialize`](Self::initialize) has completed.
    pub async fn wait_initialized(&self) {
        let mut ready = self.inner.ready.subscribe();
        // The sender lives as long as `self`, so this only returns on `true`.
        let _ = ready.wait_for(|initialized| *initialized).await;
    }

    /// Whether [`initialize`](Self::initialize) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.state.read().initialized
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// A token is persisted and initialization has completed.
    ///
    /// Purely local: no network round-trip validates the token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_initialized() && self.read_token().is_some()
    }

    /// The published user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .state
            .read()
            .user
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// The currently published user.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.read().user.clone()
    }

    /// The persisted bearer token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read_token().map(SecretString::from)
    }

    /// Snapshot for guard decisions.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            initialized: self.is_initialized(),
            authenticated: self.is_authenticated(),
            admin: self.is_admin(),
        }
    }

    /// Subscribe to current-user changes.
    ///
    /// The first item is the user published at subscription time.
    #[must_use]
    pub fn subscribe(&self) -> UserSubscription {
        let state = self.inner.state.read();
        UserSubscription {
            pending: Some(state.user.clone()),
            updates: self.inner.updates.subscribe(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Persist a freshly issued token and user, then publish the user.
    ///
    /// If the user record cannot be written the previous token is put back
    /// (or removed when there was none), so storage never holds one without
    /// the other.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if persistence fails; in that case the
    /// published state is unchanged.
    pub fn establish(&self, token: &str, user: &User) -> Result<(), ClientError> {
        let record = serde_json::to_string(user)?;

        let mut state = self.inner.state.write();
        let previous = self.inner.storage.get(&self.inner.token_key)?;
        self.inner.storage.set(&self.inner.token_key, token)?;
        if let Err(e) = self.inner.storage.set(&self.inner.user_key, &record) {
            let rollback = match &previous {
                Some(previous) => self.inner.storage.set(&self.inner.token_key, previous),
                None => self.inner.storage.remove(&self.inner.token_key),
            };
            if let Err(rollback) = rollback {
                tracing::warn!(error = %rollback, "Failed to restore token after cache write failure");
            }
            return Err(e.into());
        }

        state.user = Some(user.clone());
        let _ = self.inner.updates.send(Some(user.clone()));
        drop(state);

        telemetry::set_user(user);
        tracing::info!(user_id = %user.id, role = %user.role, "Session established");
        Ok(())
    }

    /// Overwrite the published user and its cached copy with a user fetched
    /// using `token`.
    ///
    /// Returns `Ok(false)` and changes nothing if `token` is no longer the
    /// persisted token, i.e. the session was cleared or replaced while the
    /// fetch was in flight.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the cache cannot be written; the
    /// published user is left as it was.
    pub fn replace_user(&self, token: &SecretString, user: &User) -> Result<bool, ClientError> {
        let record = serde_json::to_string(user)?;

        let mut state = self.inner.state.write();
        if self.read_token().as_deref() != Some(token.expose_secret()) {
            tracing::debug!(user_id = %user.id, "Discarding user fetched for a superseded session");
            return Ok(false);
        }

        self.inner.storage.set(&self.inner.user_key, &record)?;
        if state.user.as_ref() == Some(user) {
            return Ok(true);
        }
        state.user = Some(user.clone());
        let _ = self.inner.updates.send(Some(user.clone()));
        drop(state);

        telemetry::set_user(user);
        Ok(true)
    }

    /// Clear token, cached user and published user.
    ///
    /// Idempotent. Storage failures are logged rather than returned so that
    /// signing out can never fail.
    pub fn logout(&self) {
        let mut state = self.inner.state.write();

        for key in [&self.inner.token_key, &self.inner.user_key] {
            if let Err(e) = self.inner.storage.remove(key) {
                tracing::warn!(error = %e, key = %key, "Failed to clear persisted session key");
            }
        }

        if let Some(user) = state.user.take() {
            let _ = self.inner.updates.send(None);
            tracing::info!(user_id = %user.id, "Session cleared");
        }
        drop(state);

        telemetry::clear_user();
    }

    // =========================================================================
    // Storage helpers
    // =========================================================================

    fn read_token(&self) -> Option<String> {
        match self.inner.storage.get(&self.inner.token_key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    fn read_cached_user(&self) -> Option<User> {
        let raw = match self.inner.storage.get(&self.inner.user_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cached user");
                if let Err(e) = self.inner.storage.remove(&self.inner.user_key) {
                    tracing::warn!(error = %e, "Failed to remove unreadable cached user");
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionStore")
            .field("token_key", &self.inner.token_key)
            .field("initialized", &state.initialized)
            .field("user", &state.user)
            .finish_non_exhaustive()
    }
}

/// Stream of current-user values for one subscriber.
///
/// `None` items mean "signed out".
pub struct UserSubscription {
    pending: Option<Option<User>>,
    updates: broadcast::Receiver<Option<User>>,
}

impl UserSubscription {
    /// Wait for the next value.
    ///
    /// Returns `None` once the session store has been dropped.
    pub async fn next(&mut self) -> Option<Option<User>> {
        if let Some(current) = self.pending.take() {
            return Some(current);
        }

        loop {
            match self.updates.recv().await {
                Ok(user) => return Some(user),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "User subscription lagged; skipping to newer updates");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next value if one is already available.
    pub fn try_next(&mut self) -> Option<Option<User>> {
        if let Some(current) = self.pending.take() {
            return Some(current);
        }

        loop {
            match self.updates.try_recv() {
                Ok(user) => return Some(user),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "User subscription lagged; skipping to newer updates");
                }
                Err(_) => return None,
            }
        }
    }
}
