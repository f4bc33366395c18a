//! Activity routing.
//!
//! Routes each inbound activity to ordered lists of handler functions keyed
//! by a closed [`TurnEvent`] enum. Handlers run via sequential continuation
//! passing: each receives a [`NextEvent`] and decides whether the rest of
//! the sequence runs. Generic on-turn handlers always run before the
//! kind-specific ones.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use colloquy_channel_protocol::ActivityType;

use super::context::TurnContext;
use super::error::TurnCtxResult;

/// The closed set of routable activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnEvent {
    Message,
    Typing,
    ConversationUpdate,
    EndOfConversation,
    Event,
}

impl From<ActivityType> for TurnEvent {
    fn from(activity_type: ActivityType) -> Self {
        match activity_type {
            ActivityType::Message => Self::Message,
            ActivityType::Typing => Self::Typing,
            ActivityType::ConversationUpdate => Self::ConversationUpdate,
            ActivityType::EndOfConversation => Self::EndOfConversation,
            ActivityType::Event => Self::Event,
        }
    }
}

/// A routed handler function.
pub type EventHandler = Arc<
    dyn for<'a> Fn(&'a mut TurnContext, NextEvent<'a>) -> BoxFuture<'a, TurnCtxResult<()>>
        + Send
        + Sync,
>;

/// Continuation over the remaining handlers for this dispatch.
pub struct NextEvent<'a> {
    chain: &'a [EventHandler],
}

impl<'a> NextEvent<'a> {
    /// Run the rest of the handler sequence.
    pub async fn run(self, context: &mut TurnContext) -> TurnCtxResult<()> {
        match self.chain.split_first() {
            Some((head, rest)) => (head.as_ref())(context, NextEvent { chain: rest }).await,
            None => Ok(()),
        }
    }
}

/// Dispatches inbound activities to registered handlers.
#[derive(Default)]
pub struct ActivityRouter {
    turn_handlers: Vec<EventHandler>,
    handlers: HashMap<TurnEvent, Vec<EventHandler>>,
}

impl ActivityRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that runs for every activity, before any
    /// kind-specific handlers.
    pub fn on_turn(&mut self, handler: EventHandler) -> &mut Self {
        self.turn_handlers.push(handler);
        self
    }

    /// Register a handler for one activity kind. Handlers for the same kind
    /// run in registration order.
    pub fn on(&mut self, event: TurnEvent, handler: EventHandler) -> &mut Self {
        self.handlers.entry(event).or_default().push(handler);
        self
    }

    /// Dispatch the context's inbound activity through the matching
    /// handler sequence.
    pub async fn dispatch(&self, context: &mut TurnContext) -> TurnCtxResult<()> {
        let event = TurnEvent::from(context.activity().activity_type);
        let mut chain: Vec<EventHandler> = self.turn_handlers.clone();
        if let Some(kind_handlers) = self.handlers.get(&event) {
            chain.extend(kind_handlers.iter().cloned());
        }
        NextEvent { chain: &chain }.run(context).await
    }
}
