//! Plaza Session - local persistence and the auth session
//!
//! - [`KeyValueStore`] with [`MemoryStore`] and [`FileStore`] backends
//! - [`LocalStorage`], typed JSON access that degrades to `None` on bad data
//! - [`SessionStore`], the signed-in user and token, cached in local storage

pub mod local;
pub mod session;
pub mod storage;

pub use local::LocalStorage;
pub use session::{AuthEvent, AuthState, PersistedAuth, ProfileUpdate, SessionStore, UserProfile};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
