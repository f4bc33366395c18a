//! Telemetry contract.
//!
//! The SDK reports lifecycle events (waterfall progress, turn processing)
//! through a [`TelemetryClient`]. The default implementation is a no-op;
//! hosts plug in a real exporter at construction time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Sink for SDK telemetry.
///
/// Implementations must be cheap to call; real exporters are expected to
/// buffer internally and flush out of band.
pub trait TelemetryClient: Send + Sync {
    /// Record a named event with string properties.
    fn track_event(&self, name: &str, properties: HashMap<String, String>);

    /// Record a free-form trace message.
    fn track_trace(&self, message: &str);

    /// Record an error condition.
    fn track_exception(&self, message: &str);
}

/// The default telemetry client. Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetryClient;

impl TelemetryClient for NullTelemetryClient {
    fn track_event(&self, _name: &str, _properties: HashMap<String, String>) {}

    fn track_trace(&self, _message: &str) {}

    fn track_exception(&self, _message: &str) {}
}

/// A swappable telemetry client slot.
///
/// Dialogs hold one of these so a client set on a containing dialog set
/// propagates by shared reference, not by copy, after the dialog has been
/// registered.
pub struct TelemetrySlot {
    client: RwLock<Arc<dyn TelemetryClient>>,
}

impl TelemetrySlot {
    pub fn new() -> Self {
        Self {
            client: RwLock::new(Arc::new(NullTelemetryClient)),
        }
    }

    /// Replace the current client.
    pub fn set(&self, client: Arc<dyn TelemetryClient>) {
        *self.client.write() = client;
    }

    /// Current client, cloned out of the slot.
    pub fn client(&self) -> Arc<dyn TelemetryClient> {
        Arc::clone(&self.client.read())
    }
}

impl Default for TelemetrySlot {
    fn default() -> Self {
        Self::new()
    }
}
