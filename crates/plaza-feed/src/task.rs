//! Awaitable handles for in-flight store operations.
//!
//! The work behind a handle is spawned immediately, so the outbound request
//! is issued whether or not the caller awaits. Handles are cheap to clone;
//! every clone resolves to the same outcome.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinError;

/// Shared handle to a spawned operation.
#[derive(Clone)]
pub struct TaskHandle<T: Clone> {
    inner: Shared<BoxFuture<'static, T>>,
}

impl<T> TaskHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn `work` on the current runtime. `on_abort` supplies the outcome
    /// if the task is cancelled or panics.
    pub(crate) fn spawn<F, A>(work: F, on_abort: A) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        A: FnOnce(JoinError) -> T + Send + 'static,
    {
        let join = tokio::spawn(work);
        let inner = async move {
            match join.await {
                Ok(outcome) => outcome,
                Err(err) => on_abort(err),
            }
        }
        .boxed()
        .shared();
        Self { inner }
    }

    /// Handle that is already resolved.
    pub(crate) fn ready(outcome: T) -> Self {
        Self {
            inner: futures::future::ready(outcome).boxed().shared(),
        }
    }

    /// Outcome if the operation has already finished.
    pub fn peek(&self) -> Option<T> {
        self.inner.peek().cloned()
    }
}

impl<T: Clone> Future for TaskHandle<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl<T: Clone> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_one_outcome() {
        let handle = TaskHandle::spawn(async { 7u32 }, |_| 0);
        let clone = handle.clone();
        assert_eq!(handle.await, 7);
        assert_eq!(clone.await, 7);
    }

    #[tokio::test]
    async fn test_ready_handle() {
        let handle = TaskHandle::ready("done");
        assert_eq!(handle.peek(), Some("done"));
        assert_eq!(handle.await, "done");
    }
}
