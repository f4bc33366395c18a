//! Dialog contract and persisted stack types.
//!
//! A [`Dialog`] is a named, reusable conversational behavior with a
//! begin/continue/resume/end lifecycle. Dialogs hold no per-conversation
//! state of their own between turns: everything they need to resume lives
//! in the [`DialogInstance`] pushed onto the persisted stack, so a
//! conversation can pick up days later on a different machine.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::telemetry::{NullTelemetryClient, TelemetryClient};
use crate::turn::TurnContext;

use super::context::DialogContext;
use super::error::DialogResult;

// ============================================================================
// Persisted Types
// ============================================================================

/// One entry on the persisted dialog stack.
///
/// `state` is the instance's private working memory (step index, collected
/// values, retry counters). Its schema is defined solely by the dialog that
/// pushed the instance; the engine and every other dialog treat it as
/// opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogInstance {
    /// Id of the registered dialog this entry runs.
    pub id: String,

    /// Dialog-owned working memory. Must stay JSON-serializable.
    #[serde(default)]
    pub state: Map<String, Value>,
}

impl DialogInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Map::new(),
        }
    }
}

/// The persisted dialog stack for one conversation.
///
/// The last element is the active dialog; an empty stack means the
/// conversation is idle. This is the entire "program counter" of a
/// multi-turn conversation: it must be reconstructable from storage alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogState {
    #[serde(default)]
    pub dialog_stack: Vec<DialogInstance>,
}

// ============================================================================
// Turn Results
// ============================================================================

/// Why a dialog instance is being popped or notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogReason {
    /// The dialog completed normally via `end`.
    EndCalled,
    /// The dialog was cancelled via `cancel_all`.
    CancelCalled,
    /// The dialog was replaced in place via `replace`.
    ReplaceCalled,
}

impl DialogReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndCalled => "end_called",
            Self::CancelCalled => "cancel_called",
            Self::ReplaceCalled => "replace_called",
        }
    }
}

/// Outcome of a stack operation for the current turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogTurnResult {
    /// Whether a dialog is still running after the operation.
    pub has_active: bool,

    /// Whether the last dialog on the stack completed this turn.
    pub has_result: bool,

    /// The completed dialog's result, when `has_result` is set.
    pub result: Option<Value>,
}

impl DialogTurnResult {
    /// No dialog is active and none completed: the conversation is idle.
    pub fn empty() -> Self {
        Self {
            has_active: false,
            has_result: false,
            result: None,
        }
    }

    /// A dialog is waiting for the next inbound activity.
    pub fn end_of_turn() -> Self {
        Self {
            has_active: true,
            has_result: false,
            result: None,
        }
    }

    /// The last dialog on the stack completed with `result`.
    pub fn complete(result: Option<Value>) -> Self {
        Self {
            has_active: false,
            has_result: true,
            result,
        }
    }
}

// ============================================================================
// Dialog Contract
// ============================================================================

/// A named, reusable unit of conversational behavior.
///
/// Implementations must be stateless between invocations: any working
/// memory belongs in the active [`DialogInstance`]'s `state`, reachable
/// through the [`DialogContext`].
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Called once when the dialog is pushed onto the stack.
    ///
    /// Either produce an immediate result by calling
    /// [`DialogContext::end`], or send a prompt and return
    /// [`DialogTurnResult::end_of_turn`] to wait for the user's next
    /// message.
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult>;

    /// Called on every subsequent turn while this dialog is active.
    ///
    /// The default ends the dialog immediately, so a dialog that never
    /// overrides this cannot trap the user in an unresponsive conversation.
    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> DialogResult<DialogTurnResult> {
        dc.end(None).await
    }

    /// Called when a dialog this instance started has ended, with the
    /// child's result.
    ///
    /// The default ends this dialog too, forwarding the result to *its*
    /// parent (bubbling).
    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        dc.end(result).await
    }

    /// Re-send whatever question is pending without advancing state.
    async fn reprompt_dialog(
        &self,
        _context: &mut TurnContext,
        _instance: &mut DialogInstance,
    ) -> DialogResult<()> {
        Ok(())
    }

    /// Cleanup notification fired before this instance is popped.
    async fn end_dialog(
        &self,
        _context: &mut TurnContext,
        _instance: &mut DialogInstance,
        _reason: DialogReason,
    ) -> DialogResult<()> {
        Ok(())
    }

    /// Install a telemetry client. Dialogs that report telemetry hold the
    /// client in a [`crate::telemetry::TelemetrySlot`] so the same `Arc` is
    /// shared, not copied.
    fn set_telemetry_client(&self, _client: Arc<dyn TelemetryClient>) {}

    /// The telemetry client currently in use.
    fn telemetry_client(&self) -> Arc<dyn TelemetryClient> {
        Arc::new(NullTelemetryClient)
    }
}
