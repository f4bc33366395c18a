//! Test utilities for exercising bots without a live channel.
//!
//! [`TestAdapter`] stands in for a real transport and records everything the
//! bot sends; [`MemoryTelemetryClient`] records telemetry events. Both are
//! used by the SDK's own tests and are exported for host test suites.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use ulid::Ulid;

use colloquy_channel_protocol::{
    channels, Activity, ActivityType, ChannelAccount, ResourceResponse,
};

use crate::adapter::{AdapterResult, ChannelAdapter};
use crate::telemetry::TelemetryClient;
use crate::turn::TurnContext;

// ============================================================================
// Test Adapter
// ============================================================================

/// A channel adapter that captures outbound traffic in memory.
#[derive(Default)]
pub struct TestAdapter {
    sent: Mutex<Vec<Activity>>,
    updated: Mutex<Vec<Activity>>,
    deleted: Mutex<Vec<String>>,
}

impl TestAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All activities sent so far, in order.
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().clone()
    }

    /// Text of every sent message activity, in order.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|a| a.activity_type == ActivityType::Message)
            .filter_map(|a| a.text.clone())
            .collect()
    }

    /// Take all captured sends, clearing the buffer.
    pub fn drain(&self) -> Vec<Activity> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// All activities updated so far.
    pub fn updated(&self) -> Vec<Activity> {
        self.updated.lock().clone()
    }

    /// Ids of all deleted activities.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl ChannelAdapter for TestAdapter {
    async fn send_activities(
        &self,
        _context: &TurnContext,
        activities: &[Activity],
    ) -> AdapterResult<Vec<ResourceResponse>> {
        let mut responses = Vec::with_capacity(activities.len());
        let mut sent = self.sent.lock();
        for activity in activities {
            let mut delivered = activity.clone();
            let id = Ulid::new().to_string();
            delivered.id = Some(id.clone());
            sent.push(delivered);
            responses.push(ResourceResponse::new(id));
        }
        Ok(responses)
    }

    async fn update_activity(
        &self,
        _context: &TurnContext,
        activity: &Activity,
    ) -> AdapterResult<()> {
        self.updated.lock().push(activity.clone());
        Ok(())
    }

    async fn delete_activity(&self, _context: &TurnContext, activity_id: &str) -> AdapterResult<()> {
        self.deleted.lock().push(activity_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Activity Builders
// ============================================================================

/// An inbound user message on the test channel, fully routed.
pub fn inbound_message(text: impl Into<String>) -> Activity {
    Activity::message(text)
        .with_id(Ulid::new().to_string())
        .with_channel_id(channels::TEST)
        .with_conversation("convo-1")
        .with_from(ChannelAccount::named("user-1", "User"))
        .with_recipient(ChannelAccount::named("bot-1", "Bot"))
        .with_locale("en-US")
}

// ============================================================================
// Memory Telemetry
// ============================================================================

/// Telemetry client that records tracked events for assertions.
#[derive(Default)]
pub struct MemoryTelemetryClient {
    events: Mutex<Vec<(String, HashMap<String, String>)>>,
    traces: Mutex<Vec<String>>,
    exceptions: Mutex<Vec<String>>,
}

impl MemoryTelemetryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tracked `(name, properties)` events, in order.
    pub fn events(&self) -> Vec<(String, HashMap<String, String>)> {
        self.events.lock().clone()
    }

    /// Names of all tracked events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn traces(&self) -> Vec<String> {
        self.traces.lock().clone()
    }

    pub fn exceptions(&self) -> Vec<String> {
        self.exceptions.lock().clone()
    }
}

impl TelemetryClient for MemoryTelemetryClient {
    fn track_event(&self, name: &str, properties: HashMap<String, String>) {
        self.events.lock().push((name.to_string(), properties));
    }

    fn track_trace(&self, message: &str) {
        self.traces.lock().push(message.to_string());
    }

    fn track_exception(&self, message: &str) {
        self.exceptions.lock().push(message.to_string());
    }
}
