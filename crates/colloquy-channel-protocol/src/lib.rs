//! Channel protocol types for communication between a Colloquy bot and a
//! chat channel.
//!
//! This crate defines the activity schema exchanged with channel adapters.
//! Use this crate to build custom adapters without pulling in the full SDK.
//!
//! # Protocol Overview
//!
//! Everything a channel delivers to the bot, and everything the bot sends
//! back, is an [`Activity`]: a message, a typing indicator, a roster change,
//! or a named application event. Activities are plain serde values so they
//! survive any JSON transport or store unchanged.
//!
//! # Example: Minimal Inbound Message
//!
//! ```
//! use colloquy_channel_protocol::{Activity, ActivityType};
//!
//! let activity = Activity::message("hello")
//!     .with_channel_id(colloquy_channel_protocol::channels::TEST)
//!     .with_conversation("convo-1");
//! assert_eq!(activity.activity_type, ActivityType::Message);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Activity Types
// ============================================================================

/// The kind of an [`Activity`].
///
/// This is a closed set: routing inside the SDK dispatches over this enum
/// rather than over free-form type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// A user- or bot-authored message.
    Message,
    /// A typing indicator.
    Typing,
    /// Members joined or left the conversation.
    ConversationUpdate,
    /// The conversation has ended.
    EndOfConversation,
    /// A named application-defined event.
    Event,
}

// ============================================================================
// Accounts
// ============================================================================

/// A user or bot account on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

// ============================================================================
// Activity
// ============================================================================

/// A single unit of communication between the bot and a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// The kind of activity.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Channel-assigned activity id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Which channel the activity travelled over (e.g. "test").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,

    /// Sender of the activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,

    /// Intended recipient of the activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,

    /// Message text. Only meaningful for `Message` activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Structured payload (card submit values, event bodies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// BCP-47 locale of the sender (e.g. "en-US").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Id of the activity this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,

    /// Name of the event. Only meaningful for `Event` activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Accounts added to the conversation, for `ConversationUpdate`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
}

impl Activity {
    fn of_type(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            id: None,
            timestamp: None,
            channel_id: None,
            conversation: None,
            from: None,
            recipient: None,
            text: None,
            value: None,
            locale: None,
            reply_to_id: None,
            name: None,
            members_added: Vec::new(),
        }
    }

    /// Create a message activity with the given text.
    pub fn message(text: impl Into<String>) -> Self {
        let mut activity = Self::of_type(ActivityType::Message);
        activity.text = Some(text.into());
        activity
    }

    /// Create a typing indicator activity.
    pub fn typing() -> Self {
        Self::of_type(ActivityType::Typing)
    }

    /// Create a conversation update activity.
    pub fn conversation_update(members_added: Vec<ChannelAccount>) -> Self {
        let mut activity = Self::of_type(ActivityType::ConversationUpdate);
        activity.members_added = members_added;
        activity
    }

    /// Create an end-of-conversation activity.
    pub fn end_of_conversation() -> Self {
        Self::of_type(ActivityType::EndOfConversation)
    }

    /// Create a named event activity carrying an optional payload.
    pub fn event(name: impl Into<String>, value: Option<Value>) -> Self {
        let mut activity = Self::of_type(ActivityType::Event);
        activity.name = Some(name.into());
        activity.value = value;
        activity
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation = Some(ConversationAccount::new(conversation_id));
        self
    }

    pub fn with_from(mut self, from: ChannelAccount) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_recipient(mut self, recipient: ChannelAccount) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

impl From<&str> for Activity {
    fn from(text: &str) -> Self {
        Activity::message(text)
    }
}

impl From<String> for Activity {
    fn from(text: String) -> Self {
        Activity::message(text)
    }
}

// ============================================================================
// Resource Responses
// ============================================================================

/// Receipt returned by a channel for a delivered activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    /// Channel-assigned id of the delivered activity.
    pub id: String,
}

impl ResourceResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ============================================================================
// Well-Known Channels
// ============================================================================

/// Well-known channel ids.
pub mod channels {
    /// The in-process test channel used by the SDK test adapter.
    pub const TEST: &str = "test";
    /// The development emulator channel.
    pub const EMULATOR: &str = "emulator";
    /// Embedded web chat.
    pub const WEBCHAT: &str = "webchat";
}
