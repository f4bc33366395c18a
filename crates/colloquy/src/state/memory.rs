//! In-memory storage backend.
//!
//! Reference implementation of [`Storage`] used by tests and single-process
//! hosts. Enforces the same optimistic-concurrency contract a remote
//! document store would, so code tested against it behaves identically in
//! production.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::warn;

use super::error::{StateError, StateResult};
use super::storage::{Storage, StoreItem, ETAG_ANY};

/// Dashmap-backed [`Storage`] with monotonically increasing etags.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, (Value, u64)>,
    next_etag: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_etag(&self) -> u64 {
        self.next_etag.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, keys: &[String]) -> StateResult<HashMap<String, StoreItem>> {
        let mut items = HashMap::new();
        for key in keys {
            if let Some(entry) = self.entries.get(key) {
                let (value, etag) = entry.value();
                items.insert(
                    key.clone(),
                    StoreItem {
                        value: value.clone(),
                        etag: Some(etag.to_string()),
                    },
                );
            }
        }
        Ok(items)
    }

    async fn write(&self, changes: HashMap<String, StoreItem>) -> StateResult<()> {
        for (key, item) in changes {
            let new_etag = self.allocate_etag();
            match item.etag.as_deref() {
                None | Some(ETAG_ANY) => {
                    self.entries.insert(key, (item.value, new_etag));
                }
                Some(expected) => {
                    // The guard holds the shard lock, making check-and-swap atomic per key.
                    match self.entries.get_mut(&key) {
                        Some(mut entry) => {
                            let (stored_value, stored_etag) = entry.value_mut();
                            if stored_etag.to_string() != expected {
                                warn!(key = %key, expected, stored = %stored_etag, "etag conflict on write");
                                return Err(StateError::etag_conflict(key));
                            }
                            *stored_value = item.value;
                            *stored_etag = new_etag;
                        }
                        // A conditional write against a deleted document is stale.
                        None => return Err(StateError::etag_conflict(key)),
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StateResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }
}
