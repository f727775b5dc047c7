//! Combined state snapshot.

use plaza_chat::ChatState;
use plaza_feed::FeedState;
use plaza_session::AuthState;

/// Copy of every store's state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Auth session
    pub auth: AuthState,
    /// Feed
    pub feed: FeedState,
    /// Chat threads
    pub chat: ChatState,
}
