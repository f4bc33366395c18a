//! Waterfall dialogs.
//!
//! A waterfall is a dialog whose behavior is a fixed, ordered sequence of
//! step functions. Each step either waits for the user (end of turn),
//! starts a child dialog, skips straight to the next step via [`Next`],
//! ends the dialog, or replaces it. The current step index is the only
//! engine-owned piece of instance state, persisted under `"step"`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};

use async_trait::async_trait;

use colloquy_channel_protocol::ActivityType;

use crate::telemetry::{TelemetryClient, TelemetrySlot};
use crate::turn::TurnContext;

use super::context::DialogContext;
use super::dialog::{Dialog, DialogInstance, DialogReason, DialogTurnResult};
use super::error::{DialogError, DialogResult};

const STEP_KEY: &str = "step";

/// A single waterfall step.
///
/// Steps receive the dialog context, this step's input (begin options, the
/// user's message, or a child dialog's result), and a [`Next`] handle for
/// skipping forward without waiting for another turn.
///
/// Steps are usually written as free async functions returning a boxed
/// future:
///
/// ```ignore
/// fn ask_name<'a>(
///     dc: &'a mut DialogContext<'_>,
///     _input: Option<Value>,
///     _next: &'a Next,
/// ) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
///     Box::pin(async move {
///         dc.send_activity("What's your name?").await?;
///         Ok(DialogTurnResult::end_of_turn())
///     })
/// }
/// ```
pub type WaterfallStep = Arc<
    dyn for<'a, 'b> Fn(
            &'a mut DialogContext<'b>,
            Option<Value>,
            &'a Next,
        ) -> BoxFuture<'a, DialogResult<DialogTurnResult>>
        + Send
        + Sync,
>;

/// Skip handle passed to every waterfall step.
///
/// Calling [`Next::advance`] makes the engine run the following step
/// immediately, with the given value as its input, instead of waiting for
/// the user's next turn. A step must do exactly one of: advance, end the
/// dialog, begin/prompt a child, or replace itself; the engine does not
/// police this, but doing none of them stalls the conversation.
#[derive(Clone, Default)]
pub struct Next {
    skip: Arc<Mutex<Option<Option<Value>>>>,
}

impl Next {
    /// Run the following step immediately with `result` as its input.
    ///
    /// Returns a placeholder turn result so the step can `return` it
    /// directly; the engine discards it and runs the next step.
    pub fn advance(&self, result: Option<Value>) -> DialogTurnResult {
        *self.skip.lock() = Some(result);
        DialogTurnResult::end_of_turn()
    }

    fn take(&self) -> Option<Option<Value>> {
        self.skip.lock().take()
    }
}

/// A dialog made of an ordered list of step functions.
pub struct Waterfall {
    steps: Vec<WaterfallStep>,
    telemetry: TelemetrySlot,
}

impl Default for Waterfall {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Waterfall {
    pub fn new(steps: Vec<WaterfallStep>) -> Self {
        Self {
            steps,
            telemetry: TelemetrySlot::new(),
        }
    }

    /// Append a step. Builder-style alternative to [`Waterfall::new`].
    pub fn step(
        mut self,
        step: impl for<'a, 'b> Fn(
                &'a mut DialogContext<'b>,
                Option<Value>,
                &'a Next,
            ) -> BoxFuture<'a, DialogResult<DialogTurnResult>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn read_step(&self, dc: &DialogContext<'_>) -> DialogResult<usize> {
        let instance = dc
            .active_dialog()
            .ok_or_else(|| DialogError::no_active_dialog("waterfall"))?;
        Ok(instance
            .state
            .get(STEP_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize)
    }

    fn write_step(&self, dc: &mut DialogContext<'_>, index: usize) -> DialogResult<()> {
        let instance = dc
            .active_dialog_mut()
            .ok_or_else(|| DialogError::no_active_dialog("waterfall"))?;
        instance.state.insert(STEP_KEY.to_string(), json!(index));
        Ok(())
    }

    fn track(&self, event: &str, step: Option<usize>) {
        let mut properties = HashMap::new();
        properties.insert("step_count".to_string(), self.steps.len().to_string());
        if let Some(step) = step {
            properties.insert("step".to_string(), step.to_string());
        }
        self.telemetry.client().track_event(event, properties);
    }

    /// Run steps starting at `index`, looping while steps skip forward via
    /// [`Next::advance`]. Running past the last step ends the dialog with
    /// the last produced value.
    async fn run_from(
        &self,
        dc: &mut DialogContext<'_>,
        mut index: usize,
        mut input: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        loop {
            if index >= self.steps.len() {
                return dc.end(input).await;
            }
            self.write_step(dc, index)?;
            self.track("waterfall_step", Some(index));
            let next = Next::default();
            let result = (self.steps[index].as_ref())(dc, input, &next).await?;
            match next.take() {
                Some(skipped) => {
                    index += 1;
                    input = skipped;
                }
                None => return Ok(result),
            }
        }
    }
}

#[async_trait]
impl Dialog for Waterfall {
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        self.track("waterfall_start", None);
        self.run_from(dc, 0, options).await
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> DialogResult<DialogTurnResult> {
        // Administrative activities (typing, roster changes) must not
        // advance the sequence.
        if dc.activity().activity_type != ActivityType::Message {
            return Ok(DialogTurnResult::end_of_turn());
        }
        let step = self.read_step(dc)? + 1;
        let input = message_input(dc);
        self.run_from(dc, step, input).await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let step = self.read_step(dc)? + 1;
        self.run_from(dc, step, result).await
    }

    async fn end_dialog(
        &self,
        _context: &mut TurnContext,
        _instance: &mut DialogInstance,
        reason: DialogReason,
    ) -> DialogResult<()> {
        match reason {
            DialogReason::EndCalled => self.track("waterfall_complete", None),
            DialogReason::CancelCalled => self.track("waterfall_cancel", None),
            DialogReason::ReplaceCalled => {}
        }
        Ok(())
    }

    fn set_telemetry_client(&self, client: Arc<dyn TelemetryClient>) {
        self.telemetry.set(client);
    }

    fn telemetry_client(&self) -> Arc<dyn TelemetryClient> {
        self.telemetry.client()
    }
}

/// The raw input a message turn hands to a waterfall step: the activity's
/// text, or its value payload when there is no text.
fn message_input(dc: &DialogContext<'_>) -> Option<Value> {
    let activity = dc.activity();
    match activity.text.as_deref() {
        Some(text) if !text.is_empty() => Some(Value::String(text.to_string())),
        _ => activity.value.clone(),
    }
}
