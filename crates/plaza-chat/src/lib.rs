//! Plaza Chat - message threads, unread counts and presence
//!
//! [`ChatStore`] holds every thread the viewer belongs to. Opening a thread
//! marks it read; messages from others arriving in background threads
//! count as unread.

pub mod model;
pub mod store;

pub use model::{Message, MessageStatus, Participant, Thread, ThreadKind};
pub use store::{ChatEvent, ChatState, ChatStore};
