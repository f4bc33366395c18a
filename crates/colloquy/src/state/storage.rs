//! Key/value storage trait.
//!
//! Defines the interface the SDK persists conversation state through. The
//! contract is a plain keyed JSON document store with optimistic
//! concurrency; anything from an in-memory map to a document database can
//! sit behind it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::StateResult;

/// Etag value that always wins an optimistic-concurrency check.
pub const ETAG_ANY: &str = "*";

/// A stored document plus its concurrency tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreItem {
    /// The stored JSON document.
    pub value: Value,

    /// Concurrency tag assigned by the store on write.
    ///
    /// `None` (or [`ETAG_ANY`]) on a write means "write unconditionally";
    /// any other value means "fail unless the stored tag still matches".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl StoreItem {
    /// Create an item with no concurrency constraint.
    pub fn new(value: Value) -> Self {
        Self { value, etag: None }
    }
}

/// Storage interface for persisted bot state.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the items stored under `keys`. Missing keys are simply absent
    /// from the result, not errors.
    async fn read(&self, keys: &[String]) -> StateResult<HashMap<String, StoreItem>>;

    /// Write a batch of items, honoring each item's etag.
    async fn write(&self, changes: HashMap<String, StoreItem>) -> StateResult<()>;

    /// Delete the items stored under `keys`. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> StateResult<()>;
}
