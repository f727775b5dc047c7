//! Async task coordinator
//!
//! Bookkeeping for in-flight operations. The coordinator decides whether a
//! completing fetch or submission is still the authoritative one; the store
//! applies the resulting state change.
//!
//! Two rules keep late completions from corrupting state:
//!
//! - At most one page fetch is in flight. A completion counts only if it
//!   belongs to the tracked fetch of the current epoch.
//! - Reactions are single-slot per post. A new request replaces the slot, so
//!   the earlier request's completion is ignored (neither confirmed nor
//!   rolled back).
//!
//! [`Coordinator::reset`] bumps the epoch and forgets everything in flight.

use crate::model::{Post, ReactionKind};
use crate::task::TaskHandle;
use plaza_core::PostId;
use std::collections::HashMap;

// ============================================================================
// Outcomes
// ============================================================================

/// How a page fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was applied to the feed.
    Loaded {
        /// Page index
        page: u32,
        /// Posts received from the service
        received: usize,
        /// Whether another page may exist
        has_more: bool,
    },
    /// The fetch failed; the feed waits for a manual retry.
    Failed {
        /// Page index
        page: u32,
        /// Failure message
        message: String,
    },
    /// The result arrived after a reset or for an unexpected page and was
    /// discarded.
    Stale {
        /// Page index
        page: u32,
    },
    /// No fetch was issued because the feed has no more pages.
    Exhausted,
    /// No fetch was issued because the last one failed; call `retry`.
    AwaitingRetry,
}

/// How a reaction submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The service acknowledged; the optimistic state stands.
    Confirmed,
    /// The submission failed and the optimistic change was reverted.
    RolledBack {
        /// Failure message
        message: String,
    },
    /// A newer request for the same post, a reset or a refresh replaced
    /// this one. Nothing is rolled back.
    Superseded,
}

/// Handle to an in-flight page fetch.
pub type PageTask = TaskHandle<PageOutcome>;

/// Handle to an in-flight reaction submission.
pub type ReactionTask = TaskHandle<ReactionOutcome>;

// ============================================================================
// Pending Operations
// ============================================================================

/// Identifier of a reaction submission, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionOpId(u64);

/// A reaction change that has been applied optimistically and is awaiting
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReactionOp {
    /// Operation identifier
    pub op_id: ReactionOpId,
    /// Target post
    pub post_id: PostId,
    /// Reaction requested by the viewer
    pub requested: Option<ReactionKind>,
    /// Viewer reaction captured at dispatch
    pub previous: Option<ReactionKind>,
    epoch: u64,
}

impl PendingReactionOp {
    /// Revert this operation's optimistic change on `post`.
    pub fn roll_back(&self, post: &mut Post) {
        crate::ledger::apply_reaction_change_in_place(post, self.previous, self.requested);
    }
}

/// Whether a completing reaction is still authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionResolution {
    /// The operation still owns its post's slot; the slot is now free.
    Current(PendingReactionOp),
    /// A newer operation or a reset replaced it.
    Superseded,
}

#[derive(Debug, Clone)]
struct InFlightPage {
    page: u32,
    epoch: u64,
    handle: PageTask,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Tracks in-flight fetches and reaction submissions.
#[derive(Debug, Default)]
pub struct Coordinator {
    epoch: u64,
    next_op_id: u64,
    page: Option<InFlightPage>,
    reactions: HashMap<PostId, PendingReactionOp>,
}

impl Coordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch; bumped by every reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ─── Page fetches ────────────────────────────────────────

    /// Handle of the page fetch in flight, if any.
    pub fn in_flight_page(&self) -> Option<PageTask> {
        self.page.as_ref().map(|in_flight| in_flight.handle.clone())
    }

    /// Track a newly spawned page fetch.
    pub fn track_page(&mut self, page: u32, epoch: u64, handle: PageTask) {
        self.page = Some(InFlightPage {
            page,
            epoch,
            handle,
        });
    }

    /// Settle the fetch of `page` dispatched in `epoch`. Returns `false` if
    /// that fetch is no longer the tracked one.
    pub fn finish_page(&mut self, page: u32, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        match &self.page {
            Some(in_flight) if in_flight.page == page && in_flight.epoch == epoch => {
                self.page = None;
                true
            }
            _ => false,
        }
    }

    // ─── Reactions ───────────────────────────────────────────

    /// Open the reaction slot for `post_id`, superseding any operation
    /// already in it.
    pub fn begin_reaction(
        &mut self,
        post_id: PostId,
        requested: Option<ReactionKind>,
        previous: Option<ReactionKind>,
    ) -> PendingReactionOp {
        self.next_op_id += 1;
        let op = PendingReactionOp {
            op_id: ReactionOpId(self.next_op_id),
            post_id: post_id.clone(),
            requested,
            previous,
            epoch: self.epoch,
        };
        if let Some(replaced) = self.reactions.insert(post_id, op.clone()) {
            tracing::debug!(
                post_id = %op.post_id,
                superseded = replaced.op_id.0,
                op = op.op_id.0,
                "reaction request superseded"
            );
        }
        op
    }

    /// Settle a completing reaction operation.
    pub fn finish_reaction(&mut self, op: &PendingReactionOp) -> ReactionResolution {
        if op.epoch != self.epoch {
            return ReactionResolution::Superseded;
        }
        match self.reactions.get(&op.post_id) {
            Some(current) if current.op_id == op.op_id => match self.reactions.remove(&op.post_id) {
                Some(current) => ReactionResolution::Current(current),
                None => ReactionResolution::Superseded,
            },
            _ => ReactionResolution::Superseded,
        }
    }

    /// Operation occupying the slot of `post_id`.
    pub fn pending_reaction(&self, post_id: &PostId) -> Option<&PendingReactionOp> {
        self.reactions.get(post_id)
    }

    /// Number of reaction operations in flight.
    pub fn pending_reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Forget every reaction slot. Their completions will be ignored.
    pub fn clear_reactions(&mut self) {
        if !self.reactions.is_empty() {
            tracing::debug!(count = self.reactions.len(), "dropping pending reaction slots");
        }
        self.reactions.clear();
    }

    /// Forget everything in flight and start a new epoch.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.page = None;
        self.reactions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PostId {
        PostId::new(raw)
    }

    #[test]
    fn test_newer_reaction_supersedes_older() {
        let mut coordinator = Coordinator::new();
        let first = coordinator.begin_reaction(id("p"), Some(ReactionKind::Like), None);
        let second = coordinator.begin_reaction(
            id("p"),
            Some(ReactionKind::Love),
            Some(ReactionKind::Like),
        );

        assert_eq!(
            coordinator.finish_reaction(&second),
            ReactionResolution::Current(second.clone())
        );
        assert_eq!(
            coordinator.finish_reaction(&first),
            ReactionResolution::Superseded
        );
        assert_eq!(coordinator.pending_reaction_count(), 0);
    }

    #[test]
    fn test_old_completion_keeps_newer_slot() {
        let mut coordinator = Coordinator::new();
        let first = coordinator.begin_reaction(id("p"), Some(ReactionKind::Like), None);
        let second = coordinator.begin_reaction(id("p"), None, Some(ReactionKind::Like));

        assert_eq!(
            coordinator.finish_reaction(&first),
            ReactionResolution::Superseded
        );
        assert_eq!(coordinator.pending_reaction(&id("p")), Some(&second));
    }

    #[test]
    fn test_slots_are_per_post() {
        let mut coordinator = Coordinator::new();
        let a = coordinator.begin_reaction(id("a"), Some(ReactionKind::Wow), None);
        let b = coordinator.begin_reaction(id("b"), Some(ReactionKind::Sad), None);
        assert!(matches!(
            coordinator.finish_reaction(&a),
            ReactionResolution::Current(_)
        ));
        assert!(matches!(
            coordinator.finish_reaction(&b),
            ReactionResolution::Current(_)
        ));
    }

    #[test]
    fn test_reset_invalidates_everything() {
        let mut coordinator = Coordinator::new();
        let op = coordinator.begin_reaction(id("p"), Some(ReactionKind::Like), None);
        let epoch = coordinator.epoch();
        coordinator.track_page(0, epoch, PageTask::ready(PageOutcome::Exhausted));

        coordinator.reset();

        assert!(coordinator.in_flight_page().is_none());
        assert!(!coordinator.finish_page(0, epoch));
        assert_eq!(
            coordinator.finish_reaction(&op),
            ReactionResolution::Superseded
        );
    }

    #[test]
    fn test_finish_page_matches_page_and_epoch() {
        let mut coordinator = Coordinator::new();
        coordinator.track_page(2, 0, PageTask::ready(PageOutcome::Exhausted));
        assert!(!coordinator.finish_page(1, 0));
        assert!(coordinator.finish_page(2, 0));
        assert!(!coordinator.finish_page(2, 0));
    }

    #[test]
    fn test_roll_back_restores_post() {
        use crate::model::UserSummary;
        use chrono::Utc;
        use plaza_core::UserId;

        let author = UserSummary {
            id: UserId::new("u"),
            name: "U".to_string(),
            avatar_url: None,
        };
        let mut post = Post::new("p", author, Utc::now());
        post.reaction_counts.set(ReactionKind::Like, 3);
        let original = post.clone();

        let mut coordinator = Coordinator::new();
        let op = coordinator.begin_reaction(id("p"), Some(ReactionKind::Like), None);
        crate::ledger::apply_reaction_change_in_place(&mut post, op.requested, op.previous);
        op.roll_back(&mut post);
        assert_eq!(post, original);
    }
}
