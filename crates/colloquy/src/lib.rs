//! Colloquy - a turn-based conversational bot SDK.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐   activities    ┌──────────────────────────────────┐
//!  │ChannelAdapter│◀──────────────▶│ turn: process_turn               │
//!  │ (transport)  │                 │   TurnContext + MiddlewareSet    │
//!  └──────────────┘                 │   + ActivityRouter               │
//!                                   └───────────────┬──────────────────┘
//!  ┌──────────────┐   documents                     │
//!  │   Storage    │◀───────────────┐                ▼
//!  │ (state store)│                │  ┌──────────────────────────────┐
//!  └──────────────┘                └──│ dialog: DialogSet/Context    │
//!                                     │   Waterfall, ComponentDialog,│
//!                                     │   Prompt                     │
//!                                     └──────────────────────────────┘
//! ```
//!
//! - **turn** — per-turn execution: one inbound [`Activity`] is processed
//!   to completion through a middleware chain before the next one starts.
//! - **dialog** — the dialog stack engine: multi-step conversations whose
//!   entire state is persisted between turns, so they resume correctly
//!   days later on a different machine.
//! - **state** — the key/value persistence contract and the
//!   conversation-scoped document the stack is stored in.
//! - **adapter** / **telemetry** — transport and telemetry contracts.
//! - **testing** — in-memory adapter and telemetry capture for tests.
//!
//! # Example: a two-step conversation
//!
//! Each turn, continue whatever dialog is active; when nothing is, begin
//! one. The stack round-trips through storage between turns:
//!
//! ```ignore
//! let mut document = conversation_state.load(&context).await?;
//! let mut state = stack_property.get_or_default(&document)?;
//! let result = dialog::run_dialog(&dialogs, &mut context, &mut state, "survey", None).await?;
//! stack_property.set(&mut document, &state)?;
//! conversation_state.save(&context, &document).await?;
//! ```

pub mod adapter;
pub mod dialog;
pub mod state;
pub mod telemetry;
pub mod testing;
pub mod turn;

// Re-export the channel protocol types alongside the SDK.
pub use colloquy_channel_protocol as protocol;
pub use colloquy_channel_protocol::{
    channels, Activity, ActivityType, ChannelAccount, ConversationAccount, ResourceResponse,
};
