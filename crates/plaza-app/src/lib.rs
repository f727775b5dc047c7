//! Plaza App - composition root
//!
//! Builds the session, feed and chat stores from one [`PlazaConfig`] and
//! installs logging. Frontends depend on this crate only.
//!
//! [`PlazaConfig`]: plaza_core::PlazaConfig

mod app;
mod logging;
mod snapshot;

pub use app::{AppCore, ANONYMOUS_USER};
pub use logging::init_tracing;
pub use snapshot::StateSnapshot;

pub use plaza_chat as chat;
pub use plaza_core as foundation;
pub use plaza_feed as feed;
pub use plaza_session as session;
