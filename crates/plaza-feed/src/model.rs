//! # Feed Data Model
//!
//! Posts as delivered by the feed service, plus the observable feed state.

use chrono::{DateTime, Utc};
use plaza_core::{PostId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Reactions
// ============================================================================

/// Sentiment a viewer can attach to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
    /// Thumbs up
    Like,
    /// Heart
    Love,
    /// Laughing face
    #[serde(alias = "HA_HA")]
    Haha,
    /// Surprised face
    Wow,
    /// Crying face
    Sad,
    /// Angry face
    Angry,
}

impl ReactionKind {
    /// Every reaction kind, in display order.
    pub const ALL: [ReactionKind; 6] = [
        Self::Like,
        Self::Love,
        Self::Haha,
        Self::Wow,
        Self::Sad,
        Self::Angry,
    ];

    fn index(self) -> usize {
        match self {
            Self::Like => 0,
            Self::Love => 1,
            Self::Haha => 2,
            Self::Wow => 3,
            Self::Sad => 4,
            Self::Angry => 5,
        }
    }

    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Love => "LOVE",
            Self::Haha => "HAHA",
            Self::Wow => "WOW",
            Self::Sad => "SAD",
            Self::Angry => "ANGRY",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind reaction tallies of a post.
///
/// Counts are unsigned and decrements saturate at zero, so a tally can never
/// go negative. On the wire this is an object keyed by reaction kind; absent
/// kinds read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ReactionKind, u64>",
    into = "BTreeMap<ReactionKind, u64>"
)]
pub struct ReactionCounts {
    counts: [u64; 6],
}

impl ReactionCounts {
    /// Count for one kind.
    pub fn get(&self, kind: ReactionKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Overwrite the count for one kind.
    pub fn set(&mut self, kind: ReactionKind, count: u64) {
        self.counts[kind.index()] = count;
    }

    /// Add one to a kind.
    pub fn increment(&mut self, kind: ReactionKind) {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(1);
    }

    /// Remove one from a kind. Returns `false` (and changes nothing) when the
    /// count is already zero.
    pub fn decrement(&mut self, kind: ReactionKind) -> bool {
        let slot = &mut self.counts[kind.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Sum over all kinds.
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// `(kind, count)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ReactionKind, u64)> + '_ {
        ReactionKind::ALL.iter().map(|kind| (*kind, self.get(*kind)))
    }
}

impl FromIterator<(ReactionKind, u64)> for ReactionCounts {
    fn from_iter<I: IntoIterator<Item = (ReactionKind, u64)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (kind, count) in iter {
            counts.set(kind, count);
        }
        counts
    }
}

impl From<BTreeMap<ReactionKind, u64>> for ReactionCounts {
    fn from(map: BTreeMap<ReactionKind, u64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ReactionCounts> for BTreeMap<ReactionKind, u64> {
    fn from(counts: ReactionCounts) -> Self {
        counts.iter().collect()
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Author reference embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Author identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Avatar image reference
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

/// Media attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Asset location
    pub url: String,
    /// Asset kind
    pub kind: MediaKind,
}

/// A feed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Stable identifier, unique within the feed
    pub id: PostId,
    /// Author summary
    pub author: UserSummary,
    /// Text body
    #[serde(default)]
    pub content: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Attached media
    #[serde(default)]
    pub media: Option<Media>,
    /// Reaction tallies
    #[serde(default)]
    pub reaction_counts: ReactionCounts,
    /// Reaction applied by the current viewer
    #[serde(default)]
    pub user_reaction: Option<ReactionKind>,
    /// Number of comments (not mutated by the feed engine)
    #[serde(default)]
    pub comment_count: u64,
    /// Number of shares (not mutated by the feed engine)
    #[serde(default)]
    pub share_count: u64,
}

impl Post {
    /// Create a post with no content, media or engagement.
    pub fn new(id: impl Into<PostId>, author: UserSummary, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            author,
            content: String::new(),
            created_at,
            media: None,
            reaction_counts: ReactionCounts::default(),
            user_reaction: None,
            comment_count: 0,
            share_count: 0,
        }
    }
}

// ============================================================================
// Feed State
// ============================================================================

/// Load status of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    /// Nothing requested yet (or reset)
    #[default]
    Idle,
    /// A page fetch is in flight
    Loading,
    /// The last page fetch succeeded
    Succeeded,
    /// The last page fetch failed; waiting for a manual retry
    Failed,
}

/// Observable feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    /// Loaded posts, newest insertions first, then pages in order
    pub posts: Vec<Post>,
    /// Load status
    pub status: FeedStatus,
    /// Message of the last failed page fetch
    pub error: Option<String>,
    /// Next page index to request
    pub current_page: u32,
    /// Whether another page may exist
    pub has_more: bool,
}

impl FeedState {
    /// Look up a post by id.
    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    /// Number of loaded posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether no posts are loaded.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            status: FeedStatus::Idle,
            error: None,
            current_page: 0,
            has_more: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_never_go_below_zero() {
        let mut counts = ReactionCounts::default();
        assert!(!counts.decrement(ReactionKind::Sad));
        assert_eq!(counts.get(ReactionKind::Sad), 0);
        counts.increment(ReactionKind::Sad);
        assert!(counts.decrement(ReactionKind::Sad));
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_post_wire_format() {
        let json = r#"{
            "id": "p-1",
            "author": { "id": "u-1", "name": "Ada" },
            "content": "hello",
            "createdAt": "2024-11-30T12:00:00Z",
            "reactionCounts": { "LIKE": 3, "HA_HA": 1 },
            "userReaction": "LIKE",
            "commentCount": 2
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, PostId::new("p-1"));
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 3);
        assert_eq!(post.reaction_counts.get(ReactionKind::Haha), 1);
        assert_eq!(post.reaction_counts.get(ReactionKind::Love), 0);
        assert_eq!(post.user_reaction, Some(ReactionKind::Like));
        assert_eq!(post.comment_count, 2);
        assert_eq!(post.share_count, 0);

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["reactionCounts"]["HAHA"], 1);
        assert_eq!(value["userReaction"], "LIKE");
    }

    #[test]
    fn test_default_state_expects_more() {
        let state = FeedState::default();
        assert!(state.has_more);
        assert_eq!(state.status, FeedStatus::Idle);
        assert!(state.is_empty());
    }
}
