//! # Auth Session
//!
//! Who is signed in, with which token. The record is cached in local
//! storage under one key: read by [`SessionStore::restore`], written on
//! login and profile updates, removed on logout. Storage failures are
//! logged and never fail a transition; a missing or corrupt record means
//! signed out.

use crate::local::LocalStorage;
use parking_lot::Mutex;
use plaza_core::{EventBus, EventStream, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Model
// ============================================================================

/// Signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// Partial profile change. Only fields that are set (and non-empty) apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New profile picture URL
    pub profile_picture_url: Option<String>,
}

impl ProfileUpdate {
    fn apply_to(self, profile: &mut UserProfile) {
        if let Some(name) = non_empty(self.name) {
            profile.name = name;
        }
        if let Some(email) = non_empty(self.email) {
            profile.email = email;
        }
        if let Some(url) = non_empty(self.profile_picture_url) {
            profile.profile_picture_url = Some(url);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Record kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAuth {
    /// Whether the user was signed in when written
    #[serde(default)]
    pub is_authenticated: bool,
    /// Signed-in user
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,
}

/// Auth session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// True iff a token is held
    pub is_authenticated: bool,
    /// Signed-in user
    pub user: Option<UserProfile>,
    /// Bearer token
    pub token: Option<String>,
    /// A login is in progress
    pub is_loading: bool,
    /// Last login failure
    pub error: Option<String>,
}

impl AuthState {
    fn persisted(&self) -> PersistedAuth {
        PersistedAuth {
            is_authenticated: self.is_authenticated,
            user: self.user.clone(),
            token: self.token.clone(),
        }
    }
}

/// Session change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// State was read from storage.
    Restored {
        /// Whether a session was found
        authenticated: bool,
    },
    /// A login began.
    LoginStarted,
    /// A login succeeded.
    LoggedIn {
        /// Signed-in user
        user_id: UserId,
    },
    /// A login failed.
    LoginFailed {
        /// Failure message
        message: String,
    },
    /// The user signed out.
    LoggedOut,
    /// The profile changed.
    ProfileUpdated,
}

// ============================================================================
// Store
// ============================================================================

struct SessionInner {
    storage: LocalStorage,
    key: String,
    state: Mutex<AuthState>,
    events: EventBus<AuthEvent>,
}

/// Auth session store. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.inner.key)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Signed-out session persisted under `key`.
    pub fn new(storage: LocalStorage, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                storage,
                key: key.into(),
                state: Mutex::new(AuthState::default()),
                events: EventBus::new(),
            }),
        }
    }

    /// Session loaded from storage.
    pub async fn restore(storage: LocalStorage, key: impl Into<String>) -> Self {
        let store = Self::new(storage, key);
        store.reload().await;
        store
    }

    /// Re-read the persisted record. Authenticated iff it carries a token.
    pub async fn reload(&self) {
        let persisted: Option<PersistedAuth> = self.inner.storage.get(&self.inner.key).await;
        let authenticated = {
            let mut state = self.inner.state.lock();
            *state = match persisted {
                Some(record) => AuthState {
                    is_authenticated: record.token.is_some(),
                    user: record.user,
                    token: record.token,
                    ..AuthState::default()
                },
                None => AuthState::default(),
            };
            state.is_authenticated
        };
        tracing::info!(authenticated, "session restored");
        self.inner
            .events
            .emit(AuthEvent::Restored { authenticated });
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.inner.state.lock().clone()
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.lock().is_authenticated
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.lock().user.clone()
    }

    /// Token to send with authenticated requests.
    pub fn bearer_token(&self) -> Option<String> {
        self.inner.state.lock().token.clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> EventStream<AuthEvent> {
        self.inner.events.subscribe()
    }

    // ─── Transitions ─────────────────────────────────────────

    /// Mark a login as in progress.
    pub fn login_start(&self) {
        {
            let mut state = self.inner.state.lock();
            state.is_loading = true;
            state.error = None;
        }
        self.inner.events.emit(AuthEvent::LoginStarted);
    }

    /// Record a successful login and persist it.
    pub async fn login_success(&self, user: UserProfile, token: impl Into<String>) {
        let user_id = user.id.clone();
        let record = {
            let mut state = self.inner.state.lock();
            *state = AuthState {
                is_authenticated: true,
                user: Some(user),
                token: Some(token.into()),
                is_loading: false,
                error: None,
            };
            state.persisted()
        };
        tracing::info!(user_id = %user_id, "login succeeded");
        self.persist(&record).await;
        self.inner.events.emit(AuthEvent::LoggedIn { user_id });
    }

    /// Record a failed login.
    pub fn login_failure(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.inner.state.lock();
            *state = AuthState {
                error: Some(message.clone()),
                ..AuthState::default()
            };
        }
        tracing::warn!(error = %message, "login failed");
        self.inner.events.emit(AuthEvent::LoginFailed { message });
    }

    /// Sign out and forget the persisted record.
    pub async fn logout(&self) {
        *self.inner.state.lock() = AuthState::default();
        if let Err(e) = self.inner.storage.remove(&self.inner.key).await {
            tracing::warn!(error = %e, "could not clear persisted session");
        }
        tracing::info!("logged out");
        self.inner.events.emit(AuthEvent::LoggedOut);
    }

    /// Merge `update` into the profile and re-persist. Ignored when signed
    /// out.
    pub async fn update_profile(&self, update: ProfileUpdate) {
        let record = {
            let mut state = self.inner.state.lock();
            let Some(user) = state.user.as_mut() else {
                tracing::debug!("profile update without a signed-in user");
                return;
            };
            update.apply_to(user);
            state.persisted()
        };
        self.persist(&record).await;
        self.inner.events.emit(AuthEvent::ProfileUpdated);
    }

    async fn persist(&self, record: &PersistedAuth) {
        if let Err(e) = self.inner.storage.set(&self.inner.key, record).await {
            tracing::warn!(error = %e, "could not persist session");
        }
    }
}
