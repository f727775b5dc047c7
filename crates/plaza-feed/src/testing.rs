//! Test doubles for [`FeedTransport`].
//!
//! - [`InMemoryFeedTransport`] serves pages from a fixed list and answers
//!   immediately, with failure injection.
//! - [`ManualTransport`] parks every request until the test answers it
//!   through a [`TransportController`], which makes interleavings and
//!   timeouts deterministic.

use crate::model::{Post, ReactionKind, UserSummary};
use crate::transport::{FeedTransport, PageRequest, ReactionRequest};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use plaza_core::{TransportError, UserId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Post by a fixed author with `likes` likes.
pub fn sample_post(id: &str, likes: u64) -> Post {
    let author = UserSummary {
        id: UserId::new("author-1"),
        name: "Sample Author".to_string(),
        avatar_url: None,
    };
    let created_at = Utc
        .with_ymd_and_hms(2024, 11, 30, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let mut post = Post::new(id, author, created_at);
    post.content = format!("post {id}");
    post.reaction_counts.set(ReactionKind::Like, likes);
    post
}

/// `count` posts with ids `{prefix}-0`, `{prefix}-1`, ...
pub fn sample_posts(prefix: &str, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| sample_post(&format!("{prefix}-{i}"), 0))
        .collect()
}

// ============================================================================
// In-memory transport
// ============================================================================

/// Serves pages sliced from a fixed post list.
#[derive(Debug, Default)]
pub struct InMemoryFeedTransport {
    posts: Vec<Post>,
    failing_fetches: AtomicUsize,
    fail_reactions: AtomicBool,
    fetches: AtomicUsize,
    submissions: Mutex<Vec<ReactionRequest>>,
}

impl InMemoryFeedTransport {
    /// Transport over `posts` in feed order.
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    /// Fail the next `count` page fetches with a network error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// Reject every reaction submission while `fail` is set.
    pub fn set_fail_reactions(&self, fail: bool) {
        self.fail_reactions.store(fail, Ordering::SeqCst);
    }

    /// Number of page fetches received.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Reaction submissions received, in order.
    pub fn submissions(&self) -> Vec<ReactionRequest> {
        self.submissions.lock().clone()
    }
}

#[async_trait]
impl FeedTransport for InMemoryFeedTransport {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Post>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::network("injected fetch failure"));
        }
        let size = request.size as usize;
        let start = (request.page as usize).saturating_mul(size);
        Ok(self
            .posts
            .iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect())
    }

    async fn submit_reaction(&self, request: ReactionRequest) -> Result<(), TransportError> {
        self.submissions.lock().push(request);
        if self.fail_reactions.load(Ordering::SeqCst) {
            return Err(TransportError::rejected(503, "injected reaction failure"));
        }
        Ok(())
    }
}

// ============================================================================
// Manual transport
// ============================================================================

/// A page fetch waiting for the test's answer.
#[derive(Debug)]
pub struct PendingFetch {
    /// Request as issued by the store
    pub request: PageRequest,
    reply: oneshot::Sender<Result<Vec<Post>, TransportError>>,
}

impl PendingFetch {
    /// Answer the fetch. Ignored if the store stopped waiting.
    pub fn respond(self, result: Result<Vec<Post>, TransportError>) {
        let _ = self.reply.send(result);
    }
}

/// A reaction submission waiting for the test's answer.
#[derive(Debug)]
pub struct PendingSubmit {
    /// Request as issued by the store
    pub request: ReactionRequest,
    reply: oneshot::Sender<Result<(), TransportError>>,
}

impl PendingSubmit {
    /// Answer the submission. Ignored if the store stopped waiting.
    pub fn respond(self, result: Result<(), TransportError>) {
        let _ = self.reply.send(result);
    }
}

/// Transport whose requests complete only when the test says so.
#[derive(Debug)]
pub struct ManualTransport {
    fetch_tx: mpsc::UnboundedSender<PendingFetch>,
    submit_tx: mpsc::UnboundedSender<PendingSubmit>,
    fetches: Arc<AtomicUsize>,
    submits: Arc<AtomicUsize>,
}

/// Test-side end of a [`ManualTransport`].
#[derive(Debug)]
pub struct TransportController {
    fetch_rx: mpsc::UnboundedReceiver<PendingFetch>,
    submit_rx: mpsc::UnboundedReceiver<PendingSubmit>,
    fetches: Arc<AtomicUsize>,
    submits: Arc<AtomicUsize>,
}

impl ManualTransport {
    /// Create a transport and the controller that answers its requests.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Arc<Self>, TransportController) {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (submit_tx, submit_rx) = mpsc::unbounded_channel();
        let fetches = Arc::new(AtomicUsize::new(0));
        let submits = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(Self {
            fetch_tx,
            submit_tx,
            fetches: Arc::clone(&fetches),
            submits: Arc::clone(&submits),
        });
        let controller = TransportController {
            fetch_rx,
            submit_rx,
            fetches,
            submits,
        };
        (transport, controller)
    }
}

#[async_trait]
impl FeedTransport for ManualTransport {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Post>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();
        self.fetch_tx
            .send(PendingFetch { request, reply })
            .map_err(|_| TransportError::network("controller dropped"))?;
        rx.await
            .unwrap_or_else(|_| Err(TransportError::network("fetch abandoned")))
    }

    async fn submit_reaction(&self, request: ReactionRequest) -> Result<(), TransportError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();
        self.submit_tx
            .send(PendingSubmit { request, reply })
            .map_err(|_| TransportError::network("controller dropped"))?;
        rx.await
            .unwrap_or_else(|_| Err(TransportError::network("submission abandoned")))
    }
}

impl TransportController {
    /// Wait for the next page fetch.
    pub async fn next_fetch(&mut self) -> Option<PendingFetch> {
        self.fetch_rx.recv().await
    }

    /// Next page fetch, if one is already waiting.
    pub fn try_next_fetch(&mut self) -> Option<PendingFetch> {
        self.fetch_rx.try_recv().ok()
    }

    /// Wait for the next reaction submission.
    pub async fn next_submit(&mut self) -> Option<PendingSubmit> {
        self.submit_rx.recv().await
    }

    /// Next reaction submission, if one is already waiting.
    pub fn try_next_submit(&mut self) -> Option<PendingSubmit> {
        self.submit_rx.try_recv().ok()
    }

    /// Page fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Reaction submissions issued so far.
    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pages() {
        let transport = InMemoryFeedTransport::new(sample_posts("p", 5));
        let page = transport
            .fetch_page(PageRequest { page: 1, size: 2 })
            .await
            .unwrap();
        let ids: Vec<String> = page.iter().map(|post| post.id.to_string()).collect();
        assert_eq!(ids, vec!["p-2", "p-3"]);

        let past_end = transport
            .fetch_page(PageRequest { page: 3, size: 2 })
            .await
            .unwrap();
        assert!(past_end.is_empty());
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let transport = InMemoryFeedTransport::new(sample_posts("p", 1));
        transport.fail_next_fetches(1);
        let request = PageRequest { page: 0, size: 10 };
        assert!(transport.fetch_page(request).await.is_err());
        assert!(transport.fetch_page(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_fetch_reports_network_error() {
        let (transport, mut ctl) = ManualTransport::new();
        let call = tokio::spawn({
            let transport = Arc::clone(&transport);
            async move { transport.fetch_page(PageRequest { page: 0, size: 1 }).await }
        });
        drop(ctl.next_fetch().await.unwrap());
        assert!(matches!(
            call.await.unwrap(),
            Err(TransportError::Network(_))
        ));
    }
}
