//! # Chat Model

use chrono::{DateTime, Utc};
use plaza_core::{time, MessageId, ThreadId, UserId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Message Status
// ============================================================================

/// Delivery status of a message, from sending to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Not yet acknowledged by the service
    Sending,
    /// Acknowledged by the service
    #[default]
    Sent,
    /// Reached the recipient's device
    Delivered,
    /// Read by the recipient
    Read,
    /// Could not be sent
    Failed,
}

impl MessageStatus {
    /// Lowercase label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    /// Whether the message reached the recipient's device.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered | Self::Read)
    }

    /// Whether the message is still on its way.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Sending | Self::Sent)
    }

    /// Whether sending can be retried.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Status after the viewer opens the thread.
    #[must_use]
    pub fn on_read(self) -> Self {
        match self {
            Self::Delivered => Self::Read,
            other => other,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Threads
// ============================================================================

/// One-to-one or group conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadKind {
    /// Two participants
    #[default]
    #[serde(rename = "one-to-one")]
    Direct,
    /// Named group
    #[serde(rename = "group")]
    Group,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier
    pub id: MessageId,
    /// Author
    pub sender_id: UserId,
    /// Sent at, in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Message body
    pub text: String,
    /// Delivery status
    #[serde(default)]
    pub status: MessageStatus,
    /// Whether the viewer has seen it
    #[serde(default)]
    pub is_seen: bool,
}

impl Message {
    /// New outgoing message with a generated id, in `Sending` state.
    pub fn outgoing(sender_id: UserId, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id,
            timestamp,
            text: text.into(),
            status: MessageStatus::Sending,
            is_seen: true,
        }
    }

    /// Send time, if the timestamp is representable.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        u64::try_from(self.timestamp).ok().and_then(time::from_millis)
    }

    fn mark_read(&mut self) {
        self.is_seen = true;
        self.status = self.status.on_read();
    }
}

/// Thread participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Presence
    #[serde(default)]
    pub is_online: bool,
}

/// A conversation and its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread identifier
    pub id: ThreadId,
    /// Members
    pub participants: Vec<Participant>,
    /// Messages, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Timestamp (ms) of the latest activity
    pub last_activity: i64,
    /// Messages from others not yet read
    #[serde(default)]
    pub unread_count: u32,
    /// Direct or group
    #[serde(rename = "type", default)]
    pub kind: ThreadKind,
    /// Group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Thread {
    /// Empty direct thread.
    pub fn new(id: impl Into<ThreadId>, participants: Vec<Participant>, last_activity: i64) -> Self {
        Self {
            id: id.into(),
            participants,
            messages: Vec::new(),
            last_activity,
            unread_count: 0,
            kind: ThreadKind::Direct,
            name: None,
        }
    }

    /// Latest message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Relative label for the latest activity ("now", "5m", "3d", ...).
    pub fn activity_label(&self, now: DateTime<Utc>) -> String {
        u64::try_from(self.last_activity)
            .ok()
            .and_then(time::from_millis)
            .map(|then| time::format_relative(then, now))
            .unwrap_or_default()
    }

    /// Participant by id.
    pub fn participant(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == user_id)
    }

    /// Title shown in thread lists: the group name, or the other
    /// participants' names for direct threads.
    pub fn title(&self, viewer: &UserId) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.participants
            .iter()
            .filter(|p| &p.id != viewer)
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Zero the unread count and mark every message seen.
    pub(crate) fn mark_read(&mut self) {
        self.unread_count = 0;
        self.messages.iter_mut().for_each(Message::mark_read);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_on_read() {
        assert_eq!(MessageStatus::Delivered.on_read(), MessageStatus::Read);
        assert_eq!(MessageStatus::Sent.on_read(), MessageStatus::Sent);
        assert_eq!(MessageStatus::Failed.on_read(), MessageStatus::Failed);
        assert!(MessageStatus::Read.is_delivered());
        assert!(MessageStatus::Sending.is_pending());
    }

    #[test]
    fn test_thread_wire_format() {
        let json = r#"{
            "id": "t_1",
            "participants": [{"id": "user_2", "name": "Jane", "avatarUrl": "/a.jpg", "isOnline": true}],
            "messages": [{"id": "m1", "senderId": "user_2", "timestamp": 5, "text": "hi", "status": "delivered", "isSeen": false}],
            "lastActivity": 5,
            "unreadCount": 1,
            "type": "one-to-one"
        }"#;
        let thread: Thread = serde_json::from_str(json).unwrap();
        assert_eq!(thread.kind, ThreadKind::Direct);
        assert_eq!(thread.messages[0].status, MessageStatus::Delivered);
        assert!(thread.participants[0].is_online);
    }

    #[test]
    fn test_activity_label() {
        let now = time::from_millis(1_700_000_000_000).unwrap();
        let thread = Thread::new("t", Vec::new(), 1_700_000_000_000 - 5 * 60 * 1000);
        assert_eq!(thread.activity_label(now), "5m");
        let message = Message::outgoing(UserId::new("u"), "hi", -1);
        assert!(message.sent_at().is_none());
    }

    #[test]
    fn test_title() {
        let jane = Participant {
            id: UserId::new("u2"),
            name: "Jane".to_string(),
            avatar_url: None,
            is_online: false,
        };
        let me = Participant {
            id: UserId::new("u1"),
            name: "Me".to_string(),
            avatar_url: None,
            is_online: true,
        };
        let mut thread = Thread::new("t", vec![me, jane], 0);
        assert_eq!(thread.title(&UserId::new("u1")), "Jane");
        thread.name = Some("Team".to_string());
        assert_eq!(thread.title(&UserId::new("u1")), "Team");
    }
}
