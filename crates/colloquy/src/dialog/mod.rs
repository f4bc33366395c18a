//! The dialog stack engine.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐  create_context   ┌───────────────┐
//!  │ DialogSet  │──────────────────▶│ DialogContext │ cursor over the
//!  │ (id → Arc  │                   │  begin/continue│ persisted stack,
//!  │  <dyn      │◀──find────────────│  end/cancel/   │ valid for one turn
//!  │  Dialog>)  │                   │  replace       │
//!  └────────────┘                   └───────┬───────┘
//!                                           │ writes through to
//!                                           ▼
//!                            DialogState { dialog_stack: [ {id, state}, … ] }
//!                            (caller-persisted, JSON round-trippable)
//! ```
//!
//! The stack is the entire program counter of a multi-turn conversation.
//! It is serialized into storage between turns; execution resumes correctly
//! on any process that can load it, because no component caches stack state
//! in memory across turns.
//!
//! Data flows down as begin options and step inputs, and back up as dialog
//! results returned through [`DialogContext::end`].

mod component;
mod context;
#[allow(clippy::module_inception)]
mod dialog;
mod error;
mod prompt;
mod set;
mod waterfall;

use serde_json::Value;

use crate::turn::TurnContext;

pub use component::ComponentDialog;
pub use context::DialogContext;
pub use dialog::{Dialog, DialogInstance, DialogReason, DialogState, DialogTurnResult};
pub use error::{DialogError, DialogResult};
pub use prompt::{
    confirm_prompt, text_prompt, Prompt, PromptOptions, PromptPhrases, PromptRecognizer,
    FALLBACK_LOCALE,
};
pub use set::DialogSet;
pub use waterfall::{Next, Waterfall, WaterfallStep};

/// Drive one turn of a dialog set: continue the active dialog, and when the
/// conversation is idle begin `dialog_id` with `options`.
///
/// This is the host-side loop from the module docs packaged as a helper:
/// hosts that need interruption handling in between call
/// [`DialogContext::continue_dialog`] and [`DialogContext::begin`]
/// themselves.
pub async fn run_dialog(
    dialogs: &DialogSet,
    context: &mut TurnContext,
    state: &mut DialogState,
    dialog_id: &str,
    options: Option<Value>,
) -> DialogResult<DialogTurnResult> {
    let mut dc = dialogs.create_context(context, state);
    let result = dc.continue_dialog().await?;
    if !result.has_active && !result.has_result {
        dc.begin(dialog_id, options).await
    } else {
        Ok(result)
    }
}
