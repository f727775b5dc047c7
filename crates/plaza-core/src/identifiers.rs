//! Opaque identifiers
//!
//! Identifiers are issued by the remote service and treated as opaque
//! strings. Locally created entities (outgoing chat messages) get a random
//! UUID.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a feed post.
    PostId
);

string_id!(
    /// Identifier of a user account.
    UserId
);

string_id!(
    /// Identifier of a chat thread.
    ThreadId
);

string_id!(
    /// Identifier of a chat message.
    MessageId
);

impl MessageId {
    /// Generate an identifier for a locally composed message.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
