//! Feed transport
//!
//! The store talks to the feed service only through [`FeedTransport`]. HTTP
//! clients, fixtures and test doubles implement it; the store adds deadlines
//! on top, so implementations do not need their own.

use crate::model::{Post, ReactionKind};
use async_trait::async_trait;
use plaza_core::{PostId, TransportError};
use serde::{Deserialize, Serialize};

/// Request for one page of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: u32,
    /// Requested page size (> 0)
    pub size: u32,
}

/// Request to set or clear the viewer's reaction on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    /// Target post
    pub post_id: PostId,
    /// New reaction; `None` removes the viewer's reaction
    pub reaction_type: Option<ReactionKind>,
}

/// Outbound operations of the feed engine.
///
/// Reaction submissions are acknowledged without a payload; counts echoed
/// by the service are not trusted.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Fetch one page of posts in feed order. A short or empty page ends
    /// the feed.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Post>, TransportError>;

    /// Submit a reaction change.
    async fn submit_reaction(&self, request: ReactionRequest) -> Result<(), TransportError>;
}
