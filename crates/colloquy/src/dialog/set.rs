//! Dialog registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::telemetry::{NullTelemetryClient, TelemetryClient};
use crate::turn::TurnContext;

use super::context::DialogContext;
use super::dialog::{Dialog, DialogState};
use super::error::{DialogError, DialogResult};
use super::waterfall::{Waterfall, WaterfallStep};

/// A related set of dialogs that can call each other.
///
/// Built once at startup and read-only during conversation processing.
/// Registration collisions are programming errors and fail loudly rather
/// than being renamed or ignored.
pub struct DialogSet {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
    telemetry_client: RwLock<Option<Arc<dyn TelemetryClient>>>,
}

impl std::fmt::Debug for DialogSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSet")
            .field("dialog_ids", &self.dialogs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DialogSet {
    pub fn new() -> Self {
        Self {
            dialogs: HashMap::new(),
            telemetry_client: RwLock::new(None),
        }
    }

    /// Register a dialog under `id`.
    ///
    /// Fails with [`DialogError::DuplicateDialog`] if `id` is taken. If a
    /// telemetry client has been set on this set, it is installed on the
    /// new dialog as it is added.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        dialog: impl Dialog + 'static,
    ) -> DialogResult<&mut Self> {
        self.add_shared(id.into(), Arc::new(dialog))
    }

    /// Register an already shared dialog under `id`.
    pub fn add_shared(&mut self, id: String, dialog: Arc<dyn Dialog>) -> DialogResult<&mut Self> {
        if self.dialogs.contains_key(&id) {
            return Err(DialogError::duplicate_dialog(id));
        }
        if let Some(client) = self.telemetry_client.read().as_ref() {
            dialog.set_telemetry_client(Arc::clone(client));
        }
        debug!(dialog_id = %id, "registering dialog");
        self.dialogs.insert(id, dialog);
        Ok(self)
    }

    /// Register a waterfall dialog from a list of steps.
    pub fn add_waterfall(
        &mut self,
        id: impl Into<String>,
        steps: Vec<WaterfallStep>,
    ) -> DialogResult<&mut Self> {
        self.add(id, Waterfall::new(steps))
    }

    /// Look up a registered dialog.
    pub fn find(&self, id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.get(id).cloned()
    }

    /// Create a [`DialogContext`] bound to the caller's persisted state.
    ///
    /// Mutations through the returned context write through to `state`, so
    /// saving `state` after the turn persists the stack.
    pub fn create_context<'a>(
        &'a self,
        context: &'a mut TurnContext,
        state: &'a mut DialogState,
    ) -> DialogContext<'a> {
        DialogContext::new(self, context, state)
    }

    /// Install `client` on this set and every dialog in it, now and as they
    /// are added. `None` restores the default no-op client on each dialog.
    ///
    /// The same `Arc` is shared with every dialog, not copied.
    pub fn set_telemetry_client(&self, client: Option<Arc<dyn TelemetryClient>>) {
        let effective: Arc<dyn TelemetryClient> = match &client {
            Some(client) => Arc::clone(client),
            None => Arc::new(NullTelemetryClient),
        };
        for dialog in self.dialogs.values() {
            dialog.set_telemetry_client(Arc::clone(&effective));
        }
        *self.telemetry_client.write() = client;
    }

    /// The telemetry client installed on this set, or the no-op default.
    pub fn telemetry_client(&self) -> Arc<dyn TelemetryClient> {
        match self.telemetry_client.read().as_ref() {
            Some(client) => Arc::clone(client),
            None => Arc::new(NullTelemetryClient),
        }
    }
}

impl Default for DialogSet {
    fn default() -> Self {
        Self::new()
    }
}
