//! Per-channel adapter registry.
//!
//! Hosts that serve several channels at once register one adapter per
//! channel id. Lookup falls back to the wildcard entry (`"*"`) when no
//! exact registration exists, so a catch-all adapter can serve channels
//! that need no special handling.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::error::{AdapterError, AdapterResult};
use super::ChannelAdapter;

/// Channel id that matches any channel without an exact registration.
pub const WILDCARD_CHANNEL: &str = "*";

/// Maps channel ids to adapters, with a wildcard fallback.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ChannelAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter for a channel id. Registering the same id again
    /// replaces the previous adapter.
    ///
    /// Use [`WILDCARD_CHANNEL`] to install the fallback adapter.
    pub fn register(
        &mut self,
        channel_id: impl Into<String>,
        adapter: Arc<dyn ChannelAdapter>,
    ) -> &mut Self {
        let channel_id = channel_id.into();
        debug!(channel_id = %channel_id, "registering channel adapter");
        self.adapters.insert(channel_id, adapter);
        self
    }

    /// Resolve the adapter for a channel id.
    ///
    /// Falls back to the wildcard registration when no exact entry exists;
    /// fails when neither is present.
    pub fn get(&self, channel_id: &str) -> AdapterResult<Arc<dyn ChannelAdapter>> {
        self.adapters
            .get(channel_id)
            .or_else(|| self.adapters.get(WILDCARD_CHANNEL))
            .cloned()
            .ok_or_else(|| AdapterError::no_adapter(channel_id))
    }
}
