//! Session management for chatgate.
//!
//! Resolves a session handle for each request context, keeps a registry of
//! live sessions with an idle-TTL lifecycle, and stores the ordered
//! conversation transcript for every session.

pub mod lifecycle;
pub mod resolver;
pub mod store;
pub mod transcript;

pub use lifecycle::LifecycleManager;
pub use resolver::{RequestContext, SessionId, SessionResolver};
pub use store::{SessionEntry, SessionStore};
pub use transcript::TranscriptStore;
