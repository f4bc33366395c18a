//! Conversation-scoped state and typed property access.
//!
//! [`ConversationState`] keys one JSON document per conversation, loads it
//! at the start of a turn and writes it back (with the etag it was loaded
//! under) at the end. Dialog stacks, user profiles and anything else a bot
//! accumulates across turns live as named properties inside that document,
//! accessed through [`StateProperty`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::turn::TurnContext;

use super::error::{StateError, StateResult};
use super::storage::{Storage, StoreItem};

// ============================================================================
// State Document
// ============================================================================

/// One conversation's persisted document plus the etag it was loaded under.
#[derive(Debug, Clone, Default)]
pub struct StateDocument {
    properties: Map<String, Value>,
    etag: Option<String>,
}

impl StateDocument {
    fn from_item(item: StoreItem) -> StateResult<Self> {
        match item.value {
            Value::Object(properties) => Ok(Self {
                properties,
                etag: item.etag,
            }),
            other => Err(StateError::serialization(format!(
                "stored state is not a JSON object: {other}"
            ))),
        }
    }

    fn to_item(&self) -> StoreItem {
        StoreItem {
            value: Value::Object(self.properties.clone()),
            etag: self.etag.clone(),
        }
    }

    /// Raw access to a named property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

// ============================================================================
// Property Accessor
// ============================================================================

/// A typed, named view into a [`StateDocument`].
pub struct StateProperty<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateProperty<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// Read the property, if present.
    pub fn get(&self, document: &StateDocument) -> StateResult<Option<T>> {
        document
            .properties
            .get(&self.name)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(StateError::serialization)
    }

    /// Read the property, or its default when absent.
    pub fn get_or_default(&self, document: &StateDocument) -> StateResult<T>
    where
        T: Default,
    {
        Ok(self.get(document)?.unwrap_or_default())
    }

    /// Write the property back into the document.
    pub fn set(&self, document: &mut StateDocument, value: &T) -> StateResult<()> {
        let encoded = serde_json::to_value(value).map_err(StateError::serialization)?;
        document.properties.insert(self.name.clone(), encoded);
        Ok(())
    }

    /// Remove the property from the document.
    pub fn delete(&self, document: &mut StateDocument) {
        document.properties.remove(&self.name);
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Per-conversation persisted state backed by a [`Storage`] provider.
pub struct ConversationState {
    storage: Arc<dyn Storage>,
}

impl ConversationState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Storage key for the turn's conversation:
    /// `<channel_id>/conversations/<conversation_id>`.
    pub fn storage_key(&self, context: &TurnContext) -> StateResult<String> {
        let activity = context.activity();
        let channel_id = activity
            .channel_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(StateError::MissingChannelId)?;
        let conversation_id = activity
            .conversation
            .as_ref()
            .map(|c| c.id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(StateError::MissingConversation)?;
        Ok(format!("{channel_id}/conversations/{conversation_id}"))
    }

    /// Load the conversation's document, or a fresh one if none is stored.
    pub async fn load(&self, context: &TurnContext) -> StateResult<StateDocument> {
        let key = self.storage_key(context)?;
        let mut items = self.storage.read(std::slice::from_ref(&key)).await?;
        match items.remove(&key) {
            Some(item) => StateDocument::from_item(item),
            None => Ok(StateDocument::default()),
        }
    }

    /// Write the document back under the etag it was loaded with.
    pub async fn save(&self, context: &TurnContext, document: &StateDocument) -> StateResult<()> {
        let key = self.storage_key(context)?;
        debug!(key = %key, "saving conversation state");
        let mut changes = HashMap::new();
        changes.insert(key, document.to_item());
        self.storage.write(changes).await
    }

    /// Drop the conversation's document entirely.
    pub async fn clear(&self, context: &TurnContext) -> StateResult<()> {
        let key = self.storage_key(context)?;
        self.storage.delete(std::slice::from_ref(&key)).await
    }
}
