//! Plaza Feed - paginated post feed with optimistic reactions
//!
//! ## Layers
//!
//! - `model`: posts, reaction tallies and the feed state snapshot
//! - `ledger`: pure reaction-change transition, its own inverse
//! - `cursor`: page index, end-of-data and the in-flight guard
//! - `coordinator`: epoch and single-slot bookkeeping for in-flight work
//! - `transport`: the outbound seam to the feed service
//! - `store`: `FeedStore`, the mutation API tying the layers together
//!
//! Enable the `testing` feature for in-memory and manually driven
//! transports.

pub mod coordinator;
pub mod cursor;
pub mod ledger;
pub mod model;
pub mod store;
pub mod task;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use coordinator::{PageOutcome, PageTask, ReactionOutcome, ReactionTask};
pub use cursor::PageCursor;
pub use ledger::apply_reaction_change;
pub use model::{
    FeedState, FeedStatus, Media, MediaKind, Post, ReactionCounts, ReactionKind, UserSummary,
};
pub use store::{FeedEvent, FeedStore};
pub use task::TaskHandle;
pub use transport::{FeedTransport, PageRequest, ReactionRequest};
