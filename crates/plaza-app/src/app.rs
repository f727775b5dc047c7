//! # Application Core
//!
//! [`AppCore`] wires configuration, local storage and the three stores
//! together. Frontends hold one `AppCore` and read state through
//! [`AppCore::snapshot`] or the individual stores.

use crate::snapshot::StateSnapshot;
use plaza_chat::ChatStore;
use plaza_core::{PlazaConfig, Result, UserId};
use plaza_feed::{FeedStore, FeedTransport};
use plaza_session::{
    FileStore, KeyValueStore, LocalStorage, MemoryStore, SessionStore, UserProfile,
};
use std::sync::Arc;

/// Viewer id used by the chat store before anyone signs in.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Main application entry point.
#[derive(Debug, Clone)]
pub struct AppCore {
    config: PlazaConfig,
    session: SessionStore,
    feed: FeedStore,
    chat: ChatStore,
}

impl AppCore {
    /// Build the stores and restore any persisted session.
    ///
    /// Session data goes to `config.session.storage_path` when set and
    /// stays in memory otherwise.
    pub async fn new(config: PlazaConfig, transport: Arc<dyn FeedTransport>) -> Result<Self> {
        config.validate()?;
        let backend: Arc<dyn KeyValueStore> = match &config.session.storage_path {
            Some(path) => Arc::new(FileStore::new(path.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_storage(config, transport, backend).await)
    }

    /// Like [`new`](Self::new) with an explicit storage backend.
    pub async fn with_storage(
        config: PlazaConfig,
        transport: Arc<dyn FeedTransport>,
        backend: Arc<dyn KeyValueStore>,
    ) -> Self {
        let storage = LocalStorage::new(backend);
        let session = SessionStore::restore(storage, config.session.storage_key.clone()).await;
        let viewer = session
            .user()
            .map(|user| user.id)
            .unwrap_or_else(|| UserId::new(ANONYMOUS_USER));
        let feed = FeedStore::new(transport, config.feed.clone());
        let chat = ChatStore::new(viewer);
        tracing::info!(
            authenticated = session.is_authenticated(),
            page_size = config.feed.page_size,
            "app core ready"
        );
        Self {
            config,
            session,
            feed,
            chat,
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &PlazaConfig {
        &self.config
    }

    /// Auth session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Feed store.
    pub fn feed(&self) -> &FeedStore {
        &self.feed
    }

    /// Chat store.
    pub fn chat(&self) -> &ChatStore {
        &self.chat
    }

    /// Copy of every store's state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            auth: self.session.snapshot(),
            feed: self.feed.snapshot(),
            chat: self.chat.snapshot(),
        }
    }

    /// Complete a login: persist the session and make the user the chat
    /// viewer.
    pub async fn sign_in(&self, user: UserProfile, token: impl Into<String>) {
        let user_id = user.id.clone();
        self.session.login_success(user, token).await;
        self.chat.set_current_user(user_id);
    }

    /// Sign out and drop the viewer's feed.
    pub async fn sign_out(&self) {
        self.session.logout().await;
        self.feed.reset();
        self.chat.set_current_user(UserId::new(ANONYMOUS_USER));
    }
}
