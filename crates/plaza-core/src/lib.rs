//! Plaza Core - shared foundation for the Plaza state stores
//!
//! This crate holds what every store needs and nothing store-specific:
//!
//! - Identifiers: `PostId`, `UserId`, `ThreadId`, `MessageId`
//! - Errors: `PlazaError`, `TransportError`, `ErrorCategory`
//! - Configuration: `PlazaConfig` layered from defaults, TOML and environment
//! - Change notification: `EventBus` for store events
//! - Relative time labels for posts and messages

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod reactive;
pub mod time;

pub use config::{FeedConfig, LoggingConfig, PlazaConfig, SessionConfig};
pub use errors::{ErrorCategory, PlazaError, Result, TransportError};
pub use identifiers::{MessageId, PostId, ThreadId, UserId};
pub use reactive::{EventBus, EventStream};
