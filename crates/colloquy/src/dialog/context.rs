//! The dialog stack engine.
//!
//! A [`DialogContext`] is a cursor over one conversation's persisted dialog
//! stack for one turn. Every operation reads the active instance fresh from
//! the stack array; nothing is cached across calls, because the stack may
//! have been loaded from storage moments ago and is the single source of
//! truth.

use serde_json::Value;
use tracing::debug;

use colloquy_channel_protocol::{Activity, ResourceResponse};

use crate::turn::TurnContext;

use super::dialog::{DialogInstance, DialogReason, DialogState, DialogTurnResult};
use super::error::{DialogError, DialogResult};
use super::prompt::PromptOptions;
use super::set::DialogSet;

/// A context object used to manipulate a dialog stack.
///
/// Typically created through [`DialogSet::create_context`] and passed down
/// to dialogs and waterfall steps for the duration of one turn.
pub struct DialogContext<'a> {
    dialogs: &'a DialogSet,
    context: &'a mut TurnContext,
    stack: &'a mut Vec<DialogInstance>,
}

impl<'a> DialogContext<'a> {
    /// Create a context over a caller-supplied persisted state object.
    ///
    /// Mutations write through to `state`; persisting `state` after the
    /// turn persists the stack.
    pub fn new(
        dialogs: &'a DialogSet,
        context: &'a mut TurnContext,
        state: &'a mut DialogState,
    ) -> Self {
        Self {
            dialogs,
            context,
            stack: &mut state.dialog_stack,
        }
    }

    /// The dialog set this context resolves ids against.
    pub fn dialogs(&self) -> &DialogSet {
        self.dialogs
    }

    /// The turn context for the current turn.
    pub fn context(&mut self) -> &mut TurnContext {
        self.context
    }

    /// The inbound activity for the current turn.
    pub fn activity(&self) -> &Activity {
        self.context.activity()
    }

    /// The instance on top of the stack, if any.
    pub fn active_dialog(&self) -> Option<&DialogInstance> {
        self.stack.last()
    }

    /// Mutable access to the active instance's persisted state.
    pub fn active_dialog_mut(&mut self) -> Option<&mut DialogInstance> {
        self.stack.last_mut()
    }

    /// Number of instances on the stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Send an activity to the user through the turn context.
    pub async fn send_activity(
        &mut self,
        activity: impl Into<Activity>,
    ) -> DialogResult<ResourceResponse> {
        Ok(self.context.send_activity(activity.into()).await?)
    }

    /// Push a new instance of the dialog registered under `dialog_id` and
    /// run its begin hook.
    ///
    /// While the stack is non-empty after the call, the returned turn
    /// result never reports a result: an in-progress dialog cannot
    /// simultaneously complete.
    pub async fn begin(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let dialog = self
            .dialogs
            .find(dialog_id)
            .ok_or_else(|| DialogError::dialog_not_found("begin", dialog_id))?;
        debug!(dialog_id, depth = self.stack.len(), "beginning dialog");
        self.stack.push(DialogInstance::new(dialog_id));
        let result = dialog.begin_dialog(self, options).await?;
        Ok(self.normalize(result))
    }

    /// Begin a prompt dialog, packaging `options` the way prompts expect.
    pub async fn prompt(
        &mut self,
        dialog_id: &str,
        options: PromptOptions,
    ) -> DialogResult<DialogTurnResult> {
        let options = serde_json::to_value(options).map_err(DialogError::state_encode)?;
        self.begin(dialog_id, Some(options)).await
    }

    /// Continue the active dialog, if there is one.
    ///
    /// Returns [`DialogTurnResult::empty`] on an empty stack; callers check
    /// this to decide whether to begin something new. Fails loudly when the
    /// active instance references a dialog id that is no longer registered
    /// (schema drift after a deployment).
    pub async fn continue_dialog(&mut self) -> DialogResult<DialogTurnResult> {
        let active_id = match self.stack.last() {
            Some(instance) => instance.id.clone(),
            None => return Ok(DialogTurnResult::empty()),
        };
        let dialog = self
            .dialogs
            .find(&active_id)
            .ok_or_else(|| DialogError::dialog_not_found("continue", &active_id))?;
        dialog.continue_dialog(self).await
    }

    /// Pop the active instance and return `result` to its parent.
    ///
    /// The parent's resume hook receives the result; with no parent left,
    /// the turn result is terminal and carries the result to the host.
    pub async fn end(&mut self, result: Option<Value>) -> DialogResult<DialogTurnResult> {
        self.end_active(DialogReason::EndCalled).await?;
        let parent_id = match self.stack.last() {
            Some(instance) => instance.id.clone(),
            None => {
                debug!("dialog stack empty, turn complete");
                return Ok(DialogTurnResult::complete(result));
            }
        };
        let dialog = self
            .dialogs
            .find(&parent_id)
            .ok_or_else(|| DialogError::dialog_not_found("end", &parent_id))?;
        dialog
            .resume_dialog(self, DialogReason::EndCalled, result)
            .await
    }

    /// Pop every instance, invoking each dialog's end hook with
    /// [`DialogReason::CancelCalled`], active-first. Cleanup hooks run for
    /// every level, however deep the stack.
    pub async fn cancel_all(&mut self) -> DialogResult<DialogTurnResult> {
        debug!(depth = self.stack.len(), "cancelling all dialogs");
        while !self.stack.is_empty() {
            self.end_active(DialogReason::CancelCalled).await?;
        }
        Ok(DialogTurnResult::empty())
    }

    /// Pop the active instance with [`DialogReason::ReplaceCalled`] and
    /// begin `dialog_id` in its place.
    ///
    /// The parent is not resumed in between; from its point of view the
    /// original dialog simply continues. Used for conversational loops
    /// that re-run a dialog without growing the stack.
    pub async fn replace(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        self.end_active(DialogReason::ReplaceCalled).await?;
        self.begin(dialog_id, options).await
    }

    /// Ask the active dialog to re-send its pending prompt, without
    /// advancing any state. No-op on an empty stack.
    pub async fn reprompt(&mut self) -> DialogResult<DialogTurnResult> {
        let active_id = match self.stack.last() {
            Some(instance) => instance.id.clone(),
            None => return Ok(DialogTurnResult::empty()),
        };
        let dialog = self
            .dialogs
            .find(&active_id)
            .ok_or_else(|| DialogError::dialog_not_found("reprompt", &active_id))?;
        if let Some(instance) = self.stack.last_mut() {
            dialog.reprompt_dialog(&mut *self.context, instance).await?;
        }
        Ok(DialogTurnResult::end_of_turn())
    }

    /// Deliver a resume to the active dialog, as if a child it started had
    /// just ended with `result`.
    ///
    /// Used by container dialogs forwarding a resume into their inner
    /// stack. With no active dialog the result is terminal.
    pub(crate) async fn resume_active(
        &mut self,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let active_id = match self.stack.last() {
            Some(instance) => instance.id.clone(),
            None => return Ok(DialogTurnResult::complete(result)),
        };
        let dialog = self
            .dialogs
            .find(&active_id)
            .ok_or_else(|| DialogError::dialog_not_found("resume", &active_id))?;
        dialog.resume_dialog(self, reason, result).await
    }

    /// Notify the active dialog it is ending, then pop it.
    ///
    /// Tolerates a missing registration: a dialog that disappeared from the
    /// set can still be popped, it just gets no cleanup notification.
    async fn end_active(&mut self, reason: DialogReason) -> DialogResult<()> {
        if let Some(instance) = self.stack.last_mut() {
            debug!(dialog_id = %instance.id, reason = reason.as_str(), "ending dialog");
            if let Some(dialog) = self.dialogs.find(&instance.id) {
                dialog
                    .end_dialog(&mut *self.context, instance, reason)
                    .await?;
            }
        }
        self.stack.pop();
        Ok(())
    }

    fn normalize(&self, result: DialogTurnResult) -> DialogTurnResult {
        if self.stack.is_empty() {
            result
        } else {
            DialogTurnResult::end_of_turn()
        }
    }
}
