//! Channel adapter contract.
//!
//! An adapter is the transport edge of the SDK: it delivers outbound
//! activities to a remote channel service and (on the inbound side) hands
//! received activities to the turn pipeline. The SDK itself only depends on
//! the [`ChannelAdapter`] trait; concrete transports live outside the crate.

mod error;
mod registry;

use async_trait::async_trait;

use colloquy_channel_protocol::{Activity, ResourceResponse};

use crate::turn::TurnContext;

pub use error::{AdapterError, AdapterResult};
pub use registry::{AdapterRegistry, WILDCARD_CHANNEL};

/// Transport interface to a chat channel.
///
/// All methods receive the turn context of the turn that produced the
/// operation so adapters can recover conversation routing information.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Deliver a batch of activities, returning one receipt per activity.
    async fn send_activities(
        &self,
        context: &TurnContext,
        activities: &[Activity],
    ) -> AdapterResult<Vec<ResourceResponse>>;

    /// Replace a previously sent activity in place.
    async fn update_activity(
        &self,
        context: &TurnContext,
        activity: &Activity,
    ) -> AdapterResult<()>;

    /// Delete a previously sent activity.
    async fn delete_activity(&self, context: &TurnContext, activity_id: &str) -> AdapterResult<()>;
}

impl std::fmt::Debug for dyn ChannelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn ChannelAdapter").finish()
    }
}
