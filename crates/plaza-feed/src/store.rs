//! # Feed Store
//!
//! Owns the feed state and exposes the mutation API. Every entry point runs
//! its state transition synchronously under the store lock and spawns at
//! most one outbound request; completions take the lock again to apply
//! their result. The lock is never held across an await.
//!
//! ```text
//! load_next_page ─► cursor.begin ─► spawn fetch ─► coordinator.finish_page ─► apply / fail
//! set_reaction   ─► ledger (optimistic) ─► spawn submit ─► finish_reaction ─► confirm / roll back
//! ```
//!
//! Accepted mutations are announced on the store's event bus as
//! [`FeedEvent`]s; consumers re-read [`FeedStore::snapshot`].

use crate::coordinator::{
    Coordinator, PageOutcome, PageTask, PendingReactionOp, ReactionOutcome, ReactionResolution,
    ReactionTask,
};
use crate::cursor::{PageCursor, PageResult};
use crate::ledger;
use crate::model::{FeedState, FeedStatus, Post, ReactionKind};
use crate::transport::{FeedTransport, PageRequest, ReactionRequest};
use futures::FutureExt;
use parking_lot::Mutex;
use plaza_core::{EventBus, EventStream, FeedConfig, PlazaError, PostId, Result, TransportError};
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Events
// ============================================================================

/// Change notification emitted once per accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A page fetch started; status is `Loading`.
    LoadingStarted {
        /// Page index
        page: u32,
    },
    /// A page was applied.
    PageLoaded {
        /// Page index
        page: u32,
        /// Posts added to the feed
        added: usize,
    },
    /// A page fetch failed; status is `Failed`.
    PageFailed {
        /// Page index
        page: u32,
        /// Failure message
        message: String,
    },
    /// The feed was reset to empty.
    Reset,
    /// A post was inserted at the front.
    PostInserted {
        /// Inserted post
        post_id: PostId,
    },
    /// A reaction change was applied optimistically.
    ReactionApplied {
        /// Target post
        post_id: PostId,
        /// Reaction now shown for the viewer
        reaction: Option<ReactionKind>,
    },
    /// A failed reaction change was reverted.
    ReactionRolledBack {
        /// Target post
        post_id: PostId,
        /// Reaction restored for the viewer
        reaction: Option<ReactionKind>,
    },
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Default)]
struct StoreState {
    posts: Vec<Post>,
    status: FeedStatus,
    error: Option<String>,
    cursor: PageCursor,
    coordinator: Coordinator,
}

impl StoreState {
    fn snapshot(&self) -> FeedState {
        FeedState {
            posts: self.posts.clone(),
            status: self.status,
            error: self.error.clone(),
            current_page: self.cursor.current_page(),
            has_more: self.cursor.has_more(),
        }
    }

    fn post_mut(&mut self, post_id: &PostId) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| &post.id == post_id)
    }

    /// Replace (page 0) or append, returning the number of posts added.
    fn merge_page(&mut self, page: u32, posts: Vec<Post>) -> usize {
        if page == 0 {
            let mut seen = HashSet::new();
            self.posts = posts
                .into_iter()
                .filter(|post| seen.insert(post.id.clone()))
                .collect();
            // Fresh server state: pending optimistic changes no longer apply
            // to these copies.
            self.coordinator.clear_reactions();
            return self.posts.len();
        }
        let mut seen: HashSet<PostId> = self.posts.iter().map(|post| post.id.clone()).collect();
        let before = self.posts.len();
        for post in posts {
            if seen.insert(post.id.clone()) {
                self.posts.push(post);
            } else {
                tracing::debug!(post_id = %post.id, page, "skipping duplicate post");
            }
        }
        self.posts.len() - before
    }
}

struct StoreInner {
    transport: Arc<dyn FeedTransport>,
    config: FeedConfig,
    state: Mutex<StoreState>,
    events: EventBus<FeedEvent>,
}

/// Feed state container.
///
/// Cloning yields another handle to the same store. Operations that issue
/// requests spawn onto the current Tokio runtime.
#[derive(Clone)]
pub struct FeedStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for FeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStore")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl FeedStore {
    /// Create an empty store backed by `transport`.
    pub fn new(transport: Arc<dyn FeedTransport>, config: FeedConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                transport,
                config,
                state: Mutex::new(StoreState::default()),
                events: EventBus::new(),
            }),
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    /// Copy of the current feed state.
    pub fn snapshot(&self) -> FeedState {
        self.inner.state.lock().snapshot()
    }

    /// Copy of one post.
    pub fn post(&self, post_id: &PostId) -> Option<Post> {
        let state = self.inner.state.lock();
        state.posts.iter().find(|post| &post.id == post_id).cloned()
    }

    /// Current load status.
    pub fn status(&self) -> FeedStatus {
        self.inner.state.lock().status
    }

    /// True iff more pages may exist and no fetch is in flight.
    pub fn can_load_more(&self) -> bool {
        self.inner.state.lock().cursor.can_load_more()
    }

    /// Whether a reaction submission for `post_id` is in flight.
    pub fn has_pending_reaction(&self, post_id: &PostId) -> bool {
        self.inner
            .state
            .lock()
            .coordinator
            .pending_reaction(post_id)
            .is_some()
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> EventStream<FeedEvent> {
        self.inner.events.subscribe()
    }

    // ─── Pagination ──────────────────────────────────────────

    /// Request the next page.
    ///
    /// While a fetch is in flight this returns that fetch's handle and
    /// issues nothing. After end-of-data or a failure it resolves
    /// immediately without a request.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn load_next_page(&self) -> PageTask {
        let mut state = self.inner.state.lock();
        if let Some(in_flight) = state.coordinator.in_flight_page() {
            tracing::debug!("page fetch already in flight");
            return in_flight;
        }
        if state.status == FeedStatus::Failed {
            tracing::debug!("last page fetch failed, waiting for retry");
            return PageTask::ready(PageOutcome::AwaitingRetry);
        }
        if !state.cursor.can_load_more() {
            return PageTask::ready(PageOutcome::Exhausted);
        }
        let page = state.cursor.current_page();
        self.start_fetch(&mut state, page)
    }

    /// Re-request page 0, replacing the loaded posts when it arrives.
    /// Posts stay visible until then.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn refresh(&self) -> PageTask {
        let mut state = self.inner.state.lock();
        if let Some(in_flight) = state.coordinator.in_flight_page() {
            tracing::debug!("page fetch already in flight");
            return in_flight;
        }
        state.cursor.rewind();
        self.start_fetch(&mut state, 0)
    }

    /// Retry the page whose fetch failed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn retry(&self) -> Result<PageTask> {
        let mut state = self.inner.state.lock();
        if state.status != FeedStatus::Failed {
            return Err(PlazaError::invalid(format!(
                "retry requires a failed feed, status is {:?}",
                state.status
            )));
        }
        state.cursor.resume();
        let page = state.cursor.current_page();
        Ok(self.start_fetch(&mut state, page))
    }

    /// Restore the empty, idle feed. Results of requests issued before the
    /// reset are discarded when they arrive.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.posts.clear();
        state.status = FeedStatus::Idle;
        state.error = None;
        state.cursor.reset();
        state.coordinator.reset();
        tracing::info!("feed reset");
        self.inner.events.emit(FeedEvent::Reset);
    }

    /// Insert a newly created post at the front of the feed.
    pub fn insert_post(&self, post: Post) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.posts.iter().any(|existing| existing.id == post.id) {
            return Err(PlazaError::invalid(format!(
                "post {} is already in the feed",
                post.id
            )));
        }
        let post_id = post.id.clone();
        state.posts.insert(0, post);
        self.inner.events.emit(FeedEvent::PostInserted { post_id });
        Ok(())
    }

    fn start_fetch(&self, state: &mut StoreState, page: u32) -> PageTask {
        state.cursor.begin(page);
        state.status = FeedStatus::Loading;
        state.error = None;
        let epoch = state.coordinator.epoch();

        let inner = Arc::clone(&self.inner);
        let on_abort = Arc::clone(&self.inner);
        let handle = PageTask::spawn(inner.run_fetch(page, epoch), move |err| {
            on_abort.complete_fetch(
                page,
                epoch,
                Err(TransportError::network(format!("page fetch aborted: {err}"))),
            )
        });
        state.coordinator.track_page(page, epoch, handle.clone());
        tracing::debug!(page, "page fetch started");
        self.inner.events.emit(FeedEvent::LoadingStarted { page });
        handle
    }

    // ─── Reactions ───────────────────────────────────────────

    /// Set (or with `None`, clear) the viewer's reaction on a post.
    ///
    /// The change is applied immediately and reverted if the submission
    /// fails. A newer call for the same post supersedes an in-flight one.
    /// Unknown posts are rejected without a request.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn set_reaction(
        &self,
        post_id: &PostId,
        reaction: Option<ReactionKind>,
    ) -> Result<ReactionTask> {
        let mut state = self.inner.state.lock();
        let post = state
            .post_mut(post_id)
            .ok_or_else(|| PlazaError::not_found("post", post_id))?;
        let previous = post.user_reaction;
        ledger::apply_reaction_change_in_place(post, reaction, previous);

        let op = state
            .coordinator
            .begin_reaction(post_id.clone(), reaction, previous);
        self.inner.events.emit(FeedEvent::ReactionApplied {
            post_id: post_id.clone(),
            reaction,
        });

        let inner = Arc::clone(&self.inner);
        let on_abort = Arc::clone(&self.inner);
        let aborted_op = op.clone();
        Ok(ReactionTask::spawn(inner.run_reaction(op), move |err| {
            on_abort.complete_reaction(
                &aborted_op,
                Err(TransportError::network(format!("reaction submit aborted: {err}"))),
            )
        }))
    }
}

// ============================================================================
// Completions
// ============================================================================

impl StoreInner {
    async fn run_fetch(self: Arc<Self>, page: u32, epoch: u64) -> PageOutcome {
        let request = PageRequest {
            page,
            size: self.config.page_size,
        };
        let result = with_deadline(
            self.config.fetch_timeout(),
            self.transport.fetch_page(request),
        )
        .await;
        self.complete_fetch(page, epoch, result)
    }

    fn complete_fetch(
        &self,
        page: u32,
        epoch: u64,
        result: std::result::Result<Vec<Post>, TransportError>,
    ) -> PageOutcome {
        let mut state = self.state.lock();
        if !state.coordinator.finish_page(page, epoch) {
            tracing::debug!(page, epoch, "discarding page result from before reset");
            return PageOutcome::Stale { page };
        }

        match result {
            Ok(posts) => {
                let received = posts.len();
                match state
                    .cursor
                    .record_page_result(page, received, self.config.page_size)
                {
                    PageResult::Applied { has_more } => {
                        let added = state.merge_page(page, posts);
                        state.status = FeedStatus::Succeeded;
                        tracing::info!(page, received, added, has_more, "feed page loaded");
                        self.events.emit(FeedEvent::PageLoaded { page, added });
                        PageOutcome::Loaded {
                            page,
                            received,
                            has_more,
                        }
                    }
                    PageResult::Stale { expected } => {
                        tracing::debug!(page, expected, "page result does not match cursor");
                        state.cursor.cancel(page);
                        PageOutcome::Stale { page }
                    }
                }
            }
            Err(err) => {
                let message = err.to_string();
                state.cursor.fail(page);
                state.status = FeedStatus::Failed;
                state.error = Some(message.clone());
                tracing::warn!(page, error = %err, "feed page fetch failed");
                self.events.emit(FeedEvent::PageFailed {
                    page,
                    message: message.clone(),
                });
                PageOutcome::Failed { page, message }
            }
        }
    }

    async fn run_reaction(self: Arc<Self>, op: PendingReactionOp) -> ReactionOutcome {
        let request = ReactionRequest {
            post_id: op.post_id.clone(),
            reaction_type: op.requested,
        };
        let result = with_deadline(
            self.config.reaction_timeout(),
            self.transport.submit_reaction(request),
        )
        .await;
        self.complete_reaction(&op, result)
    }

    fn complete_reaction(
        &self,
        op: &PendingReactionOp,
        result: std::result::Result<(), TransportError>,
    ) -> ReactionOutcome {
        let mut state = self.state.lock();
        let op = match state.coordinator.finish_reaction(op) {
            ReactionResolution::Current(op) => op,
            ReactionResolution::Superseded => {
                tracing::debug!(post_id = %op.post_id, "ignoring superseded reaction result");
                return ReactionOutcome::Superseded;
            }
        };

        let err = match result {
            Ok(()) => {
                tracing::debug!(post_id = %op.post_id, "reaction confirmed");
                return ReactionOutcome::Confirmed;
            }
            Err(err) => err,
        };

        // Posts only leave the feed through reset or a page-0 replacement,
        // and both clear the reaction slots first.
        let Some(post) = state.post_mut(&op.post_id) else {
            tracing::debug!(post_id = %op.post_id, "post left the feed before rollback");
            return ReactionOutcome::Superseded;
        };
        op.roll_back(post);
        let restored = post.user_reaction;
        tracing::warn!(post_id = %op.post_id, error = %err, "reaction rolled back");
        self.events.emit(FeedEvent::ReactionRolledBack {
            post_id: op.post_id.clone(),
            reaction: restored,
        });
        ReactionOutcome::RolledBack {
            message: err.to_string(),
        }
    }
}

/// Bound `request` by `deadline`. A panicking transport counts as a
/// network failure so the completion path still runs.
async fn with_deadline<T, F>(deadline: Duration, request: F) -> std::result::Result<T, TransportError>
where
    F: Future<Output = std::result::Result<T, TransportError>>,
{
    let guarded = AssertUnwindSafe(request).catch_unwind();
    match tokio::time::timeout(deadline, guarded).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(TransportError::network("transport panicked")),
        Err(_) => Err(TransportError::Timeout {
            timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_post, sample_posts, ManualTransport};
    use assert_matches::assert_matches;
    use plaza_core::TransportError;

    fn config(page_size: u32) -> FeedConfig {
        FeedConfig {
            page_size,
            ..FeedConfig::default()
        }
    }

    #[tokio::test]
    async fn test_two_page_scenario() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));

        let task = store.load_next_page();
        assert_eq!(store.status(), FeedStatus::Loading);
        let fetch = ctl.next_fetch().await.unwrap();
        assert_eq!(fetch.request, PageRequest { page: 0, size: 10 });
        fetch.respond(Ok(sample_posts("a", 10)));
        assert_eq!(
            task.await,
            PageOutcome::Loaded {
                page: 0,
                received: 10,
                has_more: true
            }
        );
        let state = store.snapshot();
        assert!(state.has_more);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.status, FeedStatus::Succeeded);

        let task = store.load_next_page();
        let fetch = ctl.next_fetch().await.unwrap();
        assert_eq!(fetch.request.page, 1);
        fetch.respond(Ok(sample_posts("b", 4)));
        task.await;

        let state = store.snapshot();
        assert!(!state.has_more);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.posts.len(), 14);

        assert_eq!(store.load_next_page().await, PageOutcome::Exhausted);
        tokio::task::yield_now().await;
        assert_eq!(ctl.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_trigger_issues_one_fetch() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));

        let first = store.load_next_page();
        let second = store.load_next_page();
        let fetch = ctl.next_fetch().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(ctl.fetch_count(), 1);
        assert!(ctl.try_next_fetch().is_none());

        fetch.respond(Ok(sample_posts("a", 3)));
        assert_eq!(first.await, second.await);
        assert_eq!(store.snapshot().posts.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_stops_pagination_until_retry() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));

        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("a", 10)));
        task.await;

        let task = store.load_next_page();
        ctl.next_fetch()
            .await
            .unwrap()
            .respond(Err(TransportError::network("connection reset")));
        assert_matches!(task.await, PageOutcome::Failed { page: 1, .. });

        let state = store.snapshot();
        assert_eq!(state.status, FeedStatus::Failed);
        assert!(!state.has_more);
        assert!(state.error.as_deref().unwrap_or("").contains("connection reset"));
        assert_eq!(state.posts.len(), 10);

        assert_eq!(store.load_next_page().await, PageOutcome::AwaitingRetry);

        let task = store.retry().unwrap();
        let fetch = ctl.next_fetch().await.unwrap();
        assert_eq!(fetch.request.page, 1);
        fetch.respond(Ok(sample_posts("b", 2)));
        task.await;
        let state = store.snapshot();
        assert_eq!(state.status, FeedStatus::Succeeded);
        assert!(state.error.is_none());
        assert_eq!(state.posts.len(), 12);
    }

    #[tokio::test]
    async fn test_retry_requires_failure() {
        let (transport, _ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));
        assert_matches!(store.retry(), Err(PlazaError::Invalid(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_fetch_times_out() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(
            transport,
            FeedConfig {
                fetch_timeout_ms: 500,
                ..config(10)
            },
        );

        let task = store.load_next_page();
        let _stalled = ctl.next_fetch().await.unwrap();
        assert_matches!(task.await, PageOutcome::Failed { page: 0, .. });
        let state = store.snapshot();
        assert_eq!(state.status, FeedStatus::Failed);
        assert!(state.error.as_deref().unwrap_or("").contains("timed out"));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_page() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));

        let stale = store.load_next_page();
        let fetch = ctl.next_fetch().await.unwrap();
        store.reset();
        assert_eq!(store.status(), FeedStatus::Idle);

        fetch.respond(Ok(sample_posts("old", 10)));
        assert_eq!(stale.await, PageOutcome::Stale { page: 0 });
        assert!(store.snapshot().posts.is_empty());

        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("new", 1)));
        task.await;
        assert_eq!(store.snapshot().posts[0].id, PostId::new("new-0"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_posts() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(2));

        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("a", 2)));
        task.await;
        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("b", 2)));
        task.await;
        assert_eq!(store.snapshot().posts.len(), 4);

        let task = store.refresh();
        let fetch = ctl.next_fetch().await.unwrap();
        assert_eq!(fetch.request.page, 0);
        assert_eq!(store.snapshot().posts.len(), 4);
        fetch.respond(Ok(sample_posts("fresh", 2)));
        task.await;

        let state = store.snapshot();
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.current_page, 1);
        assert!(state.has_more);
    }

    #[tokio::test]
    async fn test_appending_skips_duplicate_ids() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(2));

        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("a", 2)));
        task.await;

        let task = store.load_next_page();
        let mut page = sample_posts("a", 2);
        page.truncate(1);
        page.push(sample_post("b-0", 0));
        ctl.next_fetch().await.unwrap().respond(Ok(page));
        task.await;

        let ids: Vec<String> = store
            .snapshot()
            .posts
            .iter()
            .map(|post| post.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a-0", "a-1", "b-0"]);
    }

    #[tokio::test]
    async fn test_insert_post_goes_first() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));
        let task = store.load_next_page();
        ctl.next_fetch().await.unwrap().respond(Ok(sample_posts("a", 2)));
        task.await;

        store.insert_post(sample_post("mine", 0)).unwrap();
        assert_eq!(store.snapshot().posts[0].id, PostId::new("mine"));
        assert!(store.insert_post(sample_post("a-1", 0)).is_err());
    }

    async fn store_with_post(
        likes: u64,
    ) -> (FeedStore, crate::testing::TransportController, PostId) {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));
        let task = store.load_next_page();
        ctl.next_fetch()
            .await
            .unwrap()
            .respond(Ok(vec![sample_post("x", likes)]));
        task.await;
        (store, ctl, PostId::new("x"))
    }

    #[tokio::test]
    async fn test_reaction_rolls_back_on_failure() {
        let (store, mut ctl, id) = store_with_post(3).await;

        let task = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        let post = store.post(&id).unwrap();
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 4);
        assert_eq!(post.user_reaction, Some(ReactionKind::Like));

        let submit = ctl.next_submit().await.unwrap();
        assert_eq!(submit.request.reaction_type, Some(ReactionKind::Like));
        submit.respond(Err(TransportError::rejected(500, "boom")));
        assert_matches!(task.await, ReactionOutcome::RolledBack { .. });

        let post = store.post(&id).unwrap();
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 3);
        assert_eq!(post.user_reaction, None);
        assert!(!store.has_pending_reaction(&id));
    }

    #[tokio::test]
    async fn test_reaction_confirmed_keeps_optimistic_state() {
        let (store, mut ctl, id) = store_with_post(3).await;
        let task = store.set_reaction(&id, Some(ReactionKind::Love)).unwrap();
        ctl.next_submit().await.unwrap().respond(Ok(()));
        assert_eq!(task.await, ReactionOutcome::Confirmed);
        let post = store.post(&id).unwrap();
        assert_eq!(post.reaction_counts.get(ReactionKind::Love), 1);
        assert_eq!(post.user_reaction, Some(ReactionKind::Love));
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let (store, mut ctl, id) = store_with_post(0).await;

        let a = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        let b = store.set_reaction(&id, Some(ReactionKind::Love)).unwrap();
        let submit_a = ctl.next_submit().await.unwrap();
        let submit_b = ctl.next_submit().await.unwrap();

        submit_b.respond(Ok(()));
        assert_eq!(b.await, ReactionOutcome::Confirmed);
        submit_a.respond(Err(TransportError::network("late failure")));
        assert_eq!(a.await, ReactionOutcome::Superseded);

        let post = store.post(&id).unwrap();
        assert_eq!(post.user_reaction, Some(ReactionKind::Love));
        assert_eq!(post.reaction_counts.get(ReactionKind::Love), 1);
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 0);
    }

    #[tokio::test]
    async fn test_unknown_post_is_rejected_without_request() {
        let (store, mut ctl, _) = store_with_post(0).await;
        let err = store
            .set_reaction(&PostId::new("missing"), Some(ReactionKind::Like))
            .unwrap_err();
        assert_matches!(err, PlazaError::NotFound { .. });
        tokio::task::yield_now().await;
        assert_eq!(ctl.submit_count(), 0);
        assert!(ctl.try_next_submit().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reaction_times_out_and_rolls_back() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(
            transport,
            FeedConfig {
                reaction_timeout_ms: 200,
                ..config(10)
            },
        );
        let task = store.load_next_page();
        ctl.next_fetch()
            .await
            .unwrap()
            .respond(Ok(vec![sample_post("x", 5)]));
        task.await;

        let id = PostId::new("x");
        let task = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        let _stalled = ctl.next_submit().await.unwrap();
        assert_matches!(task.await, ReactionOutcome::RolledBack { .. });
        assert_eq!(
            store.post(&id).unwrap().reaction_counts.get(ReactionKind::Like),
            5
        );
    }

    #[tokio::test]
    async fn test_reaction_after_reset_is_superseded() {
        let (store, mut ctl, id) = store_with_post(1).await;
        let task = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        let submit = ctl.next_submit().await.unwrap();
        store.reset();
        submit.respond(Err(TransportError::network("gone")));
        assert_eq!(task.await, ReactionOutcome::Superseded);
        assert!(store.snapshot().posts.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_supersedes_pending_reaction() {
        let (store, mut ctl, id) = store_with_post(3).await;
        let task = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        let submit = ctl.next_submit().await.unwrap();

        let refresh = store.refresh();
        ctl.next_fetch()
            .await
            .unwrap()
            .respond(Ok(vec![sample_post("x", 3)]));
        refresh.await;
        assert!(!store.has_pending_reaction(&id));

        let mut events = store.subscribe();
        submit.respond(Err(TransportError::network("late failure")));
        assert_eq!(task.await, ReactionOutcome::Superseded);

        let post = store.post(&id).unwrap();
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 3);
        assert_eq!(post.user_reaction, None);
        assert!(events.try_recv().is_err());
    }

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl FeedTransport for PanickingTransport {
        async fn fetch_page(
            &self,
            _request: PageRequest,
        ) -> std::result::Result<Vec<Post>, TransportError> {
            panic!("fetch exploded")
        }

        async fn submit_reaction(
            &self,
            _request: ReactionRequest,
        ) -> std::result::Result<(), TransportError> {
            panic!("submit exploded")
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_fails_the_feed() {
        let store = FeedStore::new(Arc::new(PanickingTransport), config(10));

        assert_matches!(
            store.load_next_page().await,
            PageOutcome::Failed { page: 0, .. }
        );
        let state = store.snapshot();
        assert_eq!(state.status, FeedStatus::Failed);
        assert!(!store.can_load_more());
        assert!(state.error.as_deref().unwrap_or("").contains("panicked"));

        assert_eq!(store.load_next_page().await, PageOutcome::AwaitingRetry);
        let retry = store.retry().unwrap();
        assert_matches!(retry.await, PageOutcome::Failed { page: 0, .. });
        assert_eq!(store.status(), FeedStatus::Failed);
    }

    #[tokio::test]
    async fn test_panicking_submit_rolls_back() {
        let store = FeedStore::new(Arc::new(PanickingTransport), config(10));
        store.insert_post(sample_post("x", 2)).unwrap();
        let id = PostId::new("x");

        let task = store.set_reaction(&id, Some(ReactionKind::Like)).unwrap();
        assert_matches!(task.await, ReactionOutcome::RolledBack { .. });

        let post = store.post(&id).unwrap();
        assert_eq!(post.reaction_counts.get(ReactionKind::Like), 2);
        assert_eq!(post.user_reaction, None);
        assert!(!store.has_pending_reaction(&id));
    }

    #[tokio::test]
    async fn test_every_mutation_notifies_once() {
        let (transport, mut ctl) = ManualTransport::new();
        let store = FeedStore::new(transport, config(10));
        let mut events = store.subscribe();

        let task = store.load_next_page();
        ctl.next_fetch()
            .await
            .unwrap()
            .respond(Ok(vec![sample_post("x", 0)]));
        task.await;
        let id = PostId::new("x");
        let task = store.set_reaction(&id, Some(ReactionKind::Wow)).unwrap();
        ctl.next_submit()
            .await
            .unwrap()
            .respond(Err(TransportError::network("down")));
        task.await;
        store.reset();

        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::LoadingStarted { page: 0 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::PageLoaded { page: 0, added: 1 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::ReactionApplied {
                post_id: id.clone(),
                reaction: Some(ReactionKind::Wow)
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::ReactionRolledBack {
                post_id: id,
                reaction: None
            }
        );
        assert_eq!(events.recv().await.unwrap(), FeedEvent::Reset);
        assert!(events.try_recv().is_err());
    }
}
