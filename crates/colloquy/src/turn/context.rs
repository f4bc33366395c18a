//! Per-turn context.
//!
//! A [`TurnContext`] carries the inbound activity and the send pipeline for
//! exactly one turn. Contexts are handed out by the turn runner and expired
//! when the turn completes; any operation on an expired context fails with
//! [`TurnError::TurnExpired`] rather than silently acting on a dead turn.

use std::sync::Arc;

use chrono::Utc;

use colloquy_channel_protocol::{Activity, ActivityType, ResourceResponse};

use crate::adapter::ChannelAdapter;

use super::error::{TurnCtxResult, TurnError};

/// Context for one turn of conversation with a user.
pub struct TurnContext {
    adapter: Arc<dyn ChannelAdapter>,
    activity: Activity,
    responded: bool,
    expired: bool,
}

impl TurnContext {
    /// Create a context over an inbound activity.
    pub fn new(adapter: Arc<dyn ChannelAdapter>, activity: Activity) -> Self {
        Self {
            adapter,
            activity,
            responded: false,
            expired: false,
        }
    }

    /// The inbound activity for this turn.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// The adapter this context sends through.
    pub fn adapter(&self) -> &Arc<dyn ChannelAdapter> {
        &self.adapter
    }

    /// Whether a message has been sent to the user this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Mark the turn as over. Every subsequent operation fails.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    fn ensure_live(&self) -> TurnCtxResult<()> {
        if self.expired {
            Err(TurnError::TurnExpired)
        } else {
            Ok(())
        }
    }

    /// Send a single activity to the user.
    ///
    /// Accepts anything convertible to an [`Activity`]; a plain `&str`
    /// becomes a message activity.
    pub async fn send_activity(
        &mut self,
        activity: impl Into<Activity>,
    ) -> TurnCtxResult<ResourceResponse> {
        let responses = self.send_activities(vec![activity.into()]).await?;
        responses.into_iter().next().ok_or(TurnError::MissingResponse)
    }

    /// Send a batch of activities, returning one receipt per activity.
    pub async fn send_activities(
        &mut self,
        activities: Vec<Activity>,
    ) -> TurnCtxResult<Vec<ResourceResponse>> {
        self.ensure_live()?;
        let prepared: Vec<Activity> = activities
            .into_iter()
            .map(|a| self.prepare_outbound(a))
            .collect();
        let adapter = Arc::clone(&self.adapter);
        let responses = adapter.send_activities(self, &prepared).await?;
        if prepared
            .iter()
            .any(|a| a.activity_type == ActivityType::Message)
        {
            self.responded = true;
        }
        Ok(responses)
    }

    /// Replace a previously sent activity. The activity must carry its id.
    pub async fn update_activity(&mut self, activity: Activity) -> TurnCtxResult<()> {
        self.ensure_live()?;
        let prepared = self.prepare_outbound(activity);
        let adapter = Arc::clone(&self.adapter);
        adapter.update_activity(self, &prepared).await?;
        Ok(())
    }

    /// Delete a previously sent activity by id.
    pub async fn delete_activity(&mut self, activity_id: &str) -> TurnCtxResult<()> {
        self.ensure_live()?;
        let adapter = Arc::clone(&self.adapter);
        adapter.delete_activity(self, activity_id).await?;
        Ok(())
    }

    /// Fill reply routing on an outbound activity from the inbound one.
    ///
    /// Only fields the caller left unset are populated, so explicitly
    /// addressed activities pass through untouched.
    fn prepare_outbound(&self, mut activity: Activity) -> Activity {
        if activity.channel_id.is_none() {
            activity.channel_id = self.activity.channel_id.clone();
        }
        if activity.conversation.is_none() {
            activity.conversation = self.activity.conversation.clone();
        }
        if activity.recipient.is_none() {
            activity.recipient = self.activity.from.clone();
        }
        if activity.from.is_none() {
            activity.from = self.activity.recipient.clone();
        }
        if activity.reply_to_id.is_none() {
            activity.reply_to_id = self.activity.id.clone();
        }
        if activity.locale.is_none() {
            activity.locale = self.activity.locale.clone();
        }
        if activity.timestamp.is_none() {
            activity.timestamp = Some(Utc::now());
        }
        activity
    }
}
