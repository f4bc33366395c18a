//! Component dialogs.
//!
//! A component bundles a private [`DialogSet`] behind a single [`Dialog`],
//! so a reusable conversation fragment can be registered in an outer set as
//! one addressable unit. The component's inner stack is persisted *inside*
//! its own instance's state (under `"dialogs"`), not in a separate storage
//! slot: the outer stack shows exactly one entry for the component no
//! matter how deep the inner conversation goes.
//!
//! The inner state is taken out of the instance, operated on through an
//! inner [`DialogContext`], and written back — the inner and outer stacks
//! never alias each other.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::telemetry::TelemetryClient;
use crate::turn::TurnContext;

use super::context::DialogContext;
use super::dialog::{Dialog, DialogInstance, DialogReason, DialogState, DialogTurnResult};
use super::error::{DialogError, DialogResult};
use super::set::DialogSet;

/// Key inside the component instance's state holding the inner stack.
const PERSISTED_DIALOG_STATE: &str = "dialogs";

/// A dialog that hosts its own dialog set and stack.
pub struct ComponentDialog {
    dialogs: DialogSet,
    initial_dialog_id: Option<String>,
}

impl ComponentDialog {
    pub fn new() -> Self {
        Self {
            dialogs: DialogSet::new(),
            initial_dialog_id: None,
        }
    }

    /// Register a child dialog. The first dialog added becomes the entry
    /// point unless [`ComponentDialog::set_initial_dialog_id`] overrides it.
    pub fn add_dialog(
        &mut self,
        id: impl Into<String>,
        dialog: impl Dialog + 'static,
    ) -> DialogResult<&mut Self> {
        let id = id.into();
        self.dialogs.add_shared(id.clone(), Arc::new(dialog))?;
        if self.initial_dialog_id.is_none() {
            self.initial_dialog_id = Some(id);
        }
        Ok(self)
    }

    /// Override which child dialog begins when the component does.
    pub fn set_initial_dialog_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.initial_dialog_id = Some(id.into());
        self
    }

    /// The child dialog the component starts with, if any was added.
    pub fn initial_dialog_id(&self) -> Option<&str> {
        self.initial_dialog_id.as_deref()
    }

    /// Look up a child dialog.
    pub fn find_dialog(&self, id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.find(id)
    }

    /// Take the inner stack out of the component's instance state.
    fn take_inner_state(instance: &mut DialogInstance) -> DialogResult<DialogState> {
        match instance.state.remove(PERSISTED_DIALOG_STATE) {
            Some(value) => serde_json::from_value(value).map_err(DialogError::state_decode),
            None => Ok(DialogState::default()),
        }
    }

    /// Write the inner stack back into the component's instance state.
    fn store_inner_state(instance: &mut DialogInstance, state: DialogState) -> DialogResult<()> {
        let encoded = serde_json::to_value(state).map_err(DialogError::state_encode)?;
        instance
            .state
            .insert(PERSISTED_DIALOG_STATE.to_string(), encoded);
        Ok(())
    }

    /// Translate the inner context's outcome to the outer stack: an inner
    /// completion ends the component on the outer context, forwarding the
    /// result; anything still running leaves the component waiting.
    async fn on_inner_result(
        &self,
        dc: &mut DialogContext<'_>,
        inner: DialogTurnResult,
    ) -> DialogResult<DialogTurnResult> {
        if inner.has_active {
            Ok(DialogTurnResult::end_of_turn())
        } else {
            dc.end(inner.result).await
        }
    }
}

impl Default for ComponentDialog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialog for ComponentDialog {
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let initial = self
            .initial_dialog_id
            .clone()
            .ok_or(DialogError::MissingInitialDialog)?;
        let mut inner_state = {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component begin"))?;
            Self::take_inner_state(instance)?
        };
        debug!(initial_dialog = %initial, "beginning component dialog");
        let inner_result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, dc.context(), &mut inner_state);
            inner_dc.begin(&initial, options).await
        };
        {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component begin"))?;
            Self::store_inner_state(instance, inner_state)?;
        }
        self.on_inner_result(dc, inner_result?).await
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> DialogResult<DialogTurnResult> {
        let mut inner_state = {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component continue"))?;
            Self::take_inner_state(instance)?
        };
        let inner_result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, dc.context(), &mut inner_state);
            inner_dc.continue_dialog().await
        };
        {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component continue"))?;
            Self::store_inner_state(instance, inner_state)?;
        }
        self.on_inner_result(dc, inner_result?).await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let mut inner_state = {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component resume"))?;
            Self::take_inner_state(instance)?
        };
        let inner_result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, dc.context(), &mut inner_state);
            inner_dc.resume_active(reason, result).await
        };
        {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("component resume"))?;
            Self::store_inner_state(instance, inner_state)?;
        }
        self.on_inner_result(dc, inner_result?).await
    }

    async fn reprompt_dialog(
        &self,
        context: &mut TurnContext,
        instance: &mut DialogInstance,
    ) -> DialogResult<()> {
        let mut inner_state = Self::take_inner_state(instance)?;
        let result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, context, &mut inner_state);
            inner_dc.reprompt().await
        };
        Self::store_inner_state(instance, inner_state)?;
        result.map(|_| ())
    }

    async fn end_dialog(
        &self,
        context: &mut TurnContext,
        instance: &mut DialogInstance,
        reason: DialogReason,
    ) -> DialogResult<()> {
        // Cancellation must reach every nesting level, so nested dialogs
        // get their own cancel notifications before the component goes.
        if reason == DialogReason::CancelCalled {
            let mut inner_state = Self::take_inner_state(instance)?;
            let result = {
                let mut inner_dc = DialogContext::new(&self.dialogs, context, &mut inner_state);
                inner_dc.cancel_all().await
            };
            Self::store_inner_state(instance, inner_state)?;
            result?;
        }
        Ok(())
    }

    fn set_telemetry_client(&self, client: Arc<dyn TelemetryClient>) {
        self.dialogs.set_telemetry_client(Some(client));
    }

    fn telemetry_client(&self) -> Arc<dyn TelemetryClient> {
        self.dialogs.telemetry_client()
    }
}
