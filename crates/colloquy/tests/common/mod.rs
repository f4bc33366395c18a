#![allow(dead_code)]
//! Common test utilities.

use std::sync::Arc;

use colloquy::testing::{inbound_message, TestAdapter};
use colloquy::turn::TurnContext;
use colloquy::{channels, Activity};

/// A turn context for an inbound user message on the test channel.
pub fn message_turn(adapter: &Arc<TestAdapter>, text: &str) -> TurnContext {
    TurnContext::new(adapter.clone(), inbound_message(text))
}

/// A turn context for a non-message (typing) activity in the same
/// conversation.
pub fn typing_turn(adapter: &Arc<TestAdapter>) -> TurnContext {
    let activity = Activity::typing()
        .with_channel_id(channels::TEST)
        .with_conversation("convo-1");
    TurnContext::new(adapter.clone(), activity)
}
