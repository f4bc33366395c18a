//! Persisted bot state.
//!
//! - [`Storage`] — the key/value contract a persistence provider implements.
//! - [`MemoryStorage`] — in-memory reference backend with real etag checks.
//! - [`ConversationState`] / [`StateProperty`] — the per-conversation
//!   document and the typed accessors the rest of the SDK is driven through.
//!
//! Everything that crosses the [`Storage`] boundary is plain JSON: no
//! functions, no cycles, so documents survive any storage provider.

mod conversation;
mod error;
mod memory;
mod storage;

pub use conversation::{ConversationState, StateDocument, StateProperty};
pub use error::{StateError, StateResult};
pub use memory::MemoryStorage;
pub use storage::{Storage, StoreItem, ETAG_ANY};
