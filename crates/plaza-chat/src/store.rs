//! # Chat Store
//!
//! Thread list, current thread and unread bookkeeping. Operations on
//! unknown thread or message ids change nothing and emit no event.

use crate::model::{Message, MessageStatus, Thread};
use parking_lot::Mutex;
use plaza_core::{EventBus, EventStream, MessageId, ThreadId, UserId};
use std::collections::HashMap;
use std::sync::Arc;

/// Chat state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    /// Threads by id
    pub threads: HashMap<ThreadId, Thread>,
    /// Open thread
    pub current_thread_id: Option<ThreadId>,
    /// Viewer
    pub current_user_id: UserId,
    /// A thread load is in progress
    pub is_loading: bool,
    /// Last load failure
    pub error: Option<String>,
}

impl ChatState {
    fn new(current_user_id: UserId) -> Self {
        Self {
            threads: HashMap::new(),
            current_thread_id: None,
            current_user_id,
            is_loading: false,
            error: None,
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Threads, most recently active first.
    pub fn threads_by_activity(&self) -> Vec<&Thread> {
        let mut threads: Vec<&Thread> = self.threads.values().collect();
        threads.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        threads
    }

    /// Open thread.
    pub fn current_thread(&self) -> Option<&Thread> {
        self.current_thread_id
            .as_ref()
            .and_then(|id| self.threads.get(id))
    }

    /// Unread messages across all threads.
    pub fn total_unread(&self) -> u32 {
        self.threads.values().map(|t| t.unread_count).sum()
    }
}

/// Chat change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The open thread changed.
    CurrentThreadChanged {
        /// Newly opened thread
        thread_id: ThreadId,
    },
    /// A thread load started.
    LoadingStarted,
    /// Threads were loaded.
    ThreadsLoaded {
        /// Threads received
        count: usize,
    },
    /// A thread load failed.
    LoadFailed {
        /// Failure message
        message: String,
    },
    /// A thread was added or replaced.
    ThreadAdded {
        /// Thread
        thread_id: ThreadId,
    },
    /// A message was appended.
    MessageAdded {
        /// Thread
        thread_id: ThreadId,
        /// Message
        message_id: MessageId,
    },
    /// A message's status changed.
    MessageStatusChanged {
        /// Thread
        thread_id: ThreadId,
        /// Message
        message_id: MessageId,
        /// New status
        status: MessageStatus,
    },
    /// A thread was marked read.
    ThreadRead {
        /// Thread
        thread_id: ThreadId,
    },
    /// A user's presence changed.
    PresenceChanged {
        /// User
        user_id: UserId,
        /// Presence
        is_online: bool,
    },
}

/// Chat state container. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct ChatStore {
    state: Arc<Mutex<ChatState>>,
    events: EventBus<ChatEvent>,
}

impl std::fmt::Debug for ChatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStore").finish_non_exhaustive()
    }
}

impl ChatStore {
    /// Empty store viewed by `current_user_id`.
    pub fn new(current_user_id: UserId) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(current_user_id))),
            events: EventBus::new(),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.state.lock().clone()
    }

    /// Threads, most recently active first.
    pub fn threads(&self) -> Vec<Thread> {
        let state = self.state.lock();
        state.threads_by_activity().into_iter().cloned().collect()
    }

    /// Open thread.
    pub fn current_thread(&self) -> Option<Thread> {
        self.state.lock().current_thread().cloned()
    }

    /// Viewer.
    pub fn current_user_id(&self) -> UserId {
        self.state.lock().current_user_id.clone()
    }

    /// Change the viewer, e.g. after login.
    pub fn set_current_user(&self, user_id: UserId) {
        self.state.lock().current_user_id = user_id;
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> EventStream<ChatEvent> {
        self.events.subscribe()
    }

    // ─── Threads ─────────────────────────────────────────────

    /// Open `thread_id` and mark it read.
    pub fn set_current_thread(&self, thread_id: ThreadId) {
        {
            let mut state = self.state.lock();
            if let Some(thread) = state.threads.get_mut(&thread_id) {
                thread.mark_read();
            }
            state.current_thread_id = Some(thread_id.clone());
        }
        self.events
            .emit(ChatEvent::CurrentThreadChanged { thread_id });
    }

    /// Mark a thread load as in progress.
    pub fn load_threads_start(&self) {
        {
            let mut state = self.state.lock();
            state.is_loading = true;
            state.error = None;
        }
        self.events.emit(ChatEvent::LoadingStarted);
    }

    /// Insert or replace each loaded thread.
    pub fn load_threads_success(&self, threads: Vec<Thread>) {
        let count = threads.len();
        {
            let mut state = self.state.lock();
            state.is_loading = false;
            for thread in threads {
                state.threads.insert(thread.id.clone(), thread);
            }
        }
        tracing::debug!(count, "threads loaded");
        self.events.emit(ChatEvent::ThreadsLoaded { count });
    }

    /// Record a failed thread load.
    pub fn load_threads_failure(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.state.lock();
            state.is_loading = false;
            state.error = Some(message.clone());
        }
        tracing::warn!(error = %message, "thread load failed");
        self.events.emit(ChatEvent::LoadFailed { message });
    }

    /// Insert or replace a thread.
    pub fn add_thread(&self, thread: Thread) {
        let thread_id = thread.id.clone();
        self.state.lock().threads.insert(thread_id.clone(), thread);
        self.events.emit(ChatEvent::ThreadAdded { thread_id });
    }

    // ─── Messages ────────────────────────────────────────────

    /// Append a message and bump the thread's activity. Messages from
    /// others count as unread unless the thread is open.
    pub fn add_message(&self, thread_id: &ThreadId, message: Message) {
        let message_id = message.id.clone();
        {
            let mut state = self.state.lock();
            let from_other = message.sender_id != state.current_user_id;
            let is_current = state.current_thread_id.as_ref() == Some(thread_id);
            let Some(thread) = state.threads.get_mut(thread_id) else {
                tracing::debug!(thread_id = %thread_id, "message for unknown thread ignored");
                return;
            };
            thread.last_activity = message.timestamp;
            thread.messages.push(message);
            if from_other && !is_current {
                thread.unread_count += 1;
            }
        }
        self.events.emit(ChatEvent::MessageAdded {
            thread_id: thread_id.clone(),
            message_id,
        });
    }

    /// Set the status of one message.
    pub fn update_message_status(
        &self,
        thread_id: &ThreadId,
        message_id: &MessageId,
        status: MessageStatus,
    ) {
        {
            let mut state = self.state.lock();
            let message = state
                .threads
                .get_mut(thread_id)
                .and_then(|thread| thread.messages.iter_mut().find(|m| &m.id == message_id));
            let Some(message) = message else {
                tracing::debug!(thread_id = %thread_id, message_id = %message_id, "status update for unknown message ignored");
                return;
            };
            message.status = status;
        }
        self.events.emit(ChatEvent::MessageStatusChanged {
            thread_id: thread_id.clone(),
            message_id: message_id.clone(),
            status,
        });
    }

    /// Zero the unread count, mark every message seen and promote
    /// delivered messages to read.
    pub fn mark_thread_as_read(&self, thread_id: &ThreadId) {
        {
            let mut state = self.state.lock();
            let Some(thread) = state.threads.get_mut(thread_id) else {
                tracing::debug!(thread_id = %thread_id, "mark-read for unknown thread ignored");
                return;
            };
            thread.mark_read();
        }
        self.events.emit(ChatEvent::ThreadRead {
            thread_id: thread_id.clone(),
        });
    }

    /// Update a user's presence in every thread they belong to.
    pub fn update_user_online_status(&self, user_id: &UserId, is_online: bool) {
        {
            let mut state = self.state.lock();
            state
                .threads
                .values_mut()
                .flat_map(|thread| thread.participants.iter_mut())
                .filter(|p| &p.id == user_id)
                .for_each(|p| p.is_online = is_online);
        }
        self.events.emit(ChatEvent::PresenceChanged {
            user_id: user_id.clone(),
            is_online,
        });
    }
}
