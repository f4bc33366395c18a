//! Prompt dialogs.
//!
//! A prompt is just a dialog composed with a recognizer function: begin
//! renders the question, continue tries to parse the reply. Unrecognized
//! input re-asks (the caller's retry prompt, or a locale-default phrase)
//! and keeps waiting; recognized input ends the prompt with the parsed
//! value, which flows to the parent dialog's next step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use colloquy_channel_protocol::{Activity, ActivityType};

use crate::telemetry::{TelemetryClient, TelemetrySlot};
use crate::turn::TurnContext;

use super::context::DialogContext;
use super::dialog::{Dialog, DialogInstance, DialogTurnResult};
use super::error::{DialogError, DialogResult};

/// Key inside the prompt instance's state holding its options.
const OPTIONS_KEY: &str = "options";

/// Locale key used when the sender's locale has no phrase entry.
pub const FALLBACK_LOCALE: &str = "en-us";

/// Attempts to extract a value from the user's reply.
///
/// Returning `None` means "not understood": the prompt re-asks and keeps
/// waiting.
pub type PromptRecognizer = Arc<dyn Fn(&Activity) -> Option<Value> + Send + Sync>;

/// Options a caller supplies when beginning a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptOptions {
    /// The question to ask.
    pub prompt: String,

    /// Sent when input is not recognized. Falls back to the locale-default
    /// phrase when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_prompt: Option<String>,
}

impl PromptOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            retry_prompt: None,
        }
    }

    pub fn with_retry(mut self, retry_prompt: impl Into<String>) -> Self {
        self.retry_prompt = Some(retry_prompt.into());
        self
    }
}

/// Default phrasing for one locale.
#[derive(Debug, Clone)]
pub struct PromptPhrases {
    /// Sent when input is not recognized and no retry prompt was supplied.
    pub retry: String,
}

/// A question-and-parse dialog built from a recognizer strategy.
pub struct Prompt {
    recognizer: PromptRecognizer,
    phrases: HashMap<String, PromptPhrases>,
    telemetry: TelemetrySlot,
}

impl Prompt {
    /// Create a prompt with the built-in phrase table.
    pub fn new(recognizer: PromptRecognizer) -> Self {
        Self::with_phrases(recognizer, HashMap::new())
    }

    /// Create a prompt with caller-supplied per-locale phrasing.
    ///
    /// The map is read-only after construction. Keys are normalized to
    /// lowercase; lookups fall back to [`FALLBACK_LOCALE`], which is always
    /// present.
    pub fn with_phrases(
        recognizer: PromptRecognizer,
        phrases: HashMap<String, PromptPhrases>,
    ) -> Self {
        let mut normalized: HashMap<String, PromptPhrases> = phrases
            .into_iter()
            .map(|(locale, entry)| (locale.to_lowercase(), entry))
            .collect();
        normalized
            .entry(FALLBACK_LOCALE.to_string())
            .or_insert_with(|| PromptPhrases {
                retry: "Sorry, I didn't understand that. Please try again.".to_string(),
            });
        Self {
            recognizer,
            phrases: normalized,
            telemetry: TelemetrySlot::new(),
        }
    }

    fn phrases_for(&self, locale: Option<&str>) -> &PromptPhrases {
        locale
            .map(str::to_lowercase)
            .and_then(|key| self.phrases.get(&key))
            .unwrap_or_else(|| &self.phrases[FALLBACK_LOCALE])
    }

    fn read_options(&self, instance: &DialogInstance) -> DialogResult<PromptOptions> {
        let value = instance
            .state
            .get(OPTIONS_KEY)
            .cloned()
            .ok_or_else(|| DialogError::state_decode("prompt options missing from state"))?;
        serde_json::from_value(value).map_err(DialogError::state_decode)
    }
}

#[async_trait]
impl Dialog for Prompt {
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> DialogResult<DialogTurnResult> {
        let options: PromptOptions = match options {
            Some(value) => serde_json::from_value(value).map_err(DialogError::state_decode)?,
            None => return Err(DialogError::state_decode("prompt begun without options")),
        };
        {
            let instance = dc
                .active_dialog_mut()
                .ok_or_else(|| DialogError::no_active_dialog("prompt begin"))?;
            let encoded = serde_json::to_value(&options).map_err(DialogError::state_encode)?;
            instance.state.insert(OPTIONS_KEY.to_string(), encoded);
        }
        dc.send_activity(options.prompt.as_str()).await?;
        Ok(DialogTurnResult::end_of_turn())
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> DialogResult<DialogTurnResult> {
        if dc.activity().activity_type != ActivityType::Message {
            return Ok(DialogTurnResult::end_of_turn());
        }
        if let Some(value) = (self.recognizer.as_ref())(dc.activity()) {
            return dc.end(Some(value)).await;
        }
        self.telemetry
            .client()
            .track_event("prompt_retry", HashMap::new());
        let options = {
            let instance = dc
                .active_dialog()
                .ok_or_else(|| DialogError::no_active_dialog("prompt continue"))?;
            self.read_options(instance)?
        };
        let retry = match options.retry_prompt {
            Some(retry) => retry,
            None => {
                let locale = dc.activity().locale.clone();
                self.phrases_for(locale.as_deref()).retry.clone()
            }
        };
        dc.send_activity(retry.as_str()).await?;
        Ok(DialogTurnResult::end_of_turn())
    }

    async fn reprompt_dialog(
        &self,
        context: &mut TurnContext,
        instance: &mut DialogInstance,
    ) -> DialogResult<()> {
        let options = self.read_options(instance)?;
        context.send_activity(options.prompt.as_str()).await?;
        Ok(())
    }

    fn set_telemetry_client(&self, client: Arc<dyn TelemetryClient>) {
        self.telemetry.set(client);
    }

    fn telemetry_client(&self) -> Arc<dyn TelemetryClient> {
        self.telemetry.client()
    }
}

// ============================================================================
// Built-in Recognizers
// ============================================================================

/// A prompt that accepts any non-empty message text.
pub fn text_prompt() -> Prompt {
    Prompt::new(Arc::new(|activity: &Activity| {
        activity
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| Value::String(text.to_string()))
    }))
}

/// A prompt that accepts yes/no style answers as a boolean.
pub fn confirm_prompt() -> Prompt {
    Prompt::new(Arc::new(|activity: &Activity| {
        let text = activity.text.as_deref()?.trim().to_lowercase();
        match text.as_str() {
            "yes" | "y" | "sure" | "ok" | "true" => Some(Value::Bool(true)),
            "no" | "n" | "nope" | "false" => Some(Value::Bool(false)),
            _ => None,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_lookup_normalizes_and_falls_back() {
        let mut phrases = HashMap::new();
        phrases.insert(
            "fr-FR".to_string(),
            PromptPhrases {
                retry: "Désolé, je n'ai pas compris.".to_string(),
            },
        );
        let prompt = text_prompt_with(phrases);

        assert!(prompt.phrases_for(Some("fr-FR")).retry.starts_with("Désolé"));
        assert!(prompt.phrases_for(Some("fr-fr")).retry.starts_with("Désolé"));
        // Unknown locales and no locale at all fall back to en-us.
        assert!(prompt.phrases_for(Some("de-DE")).retry.starts_with("Sorry"));
        assert!(prompt.phrases_for(None).retry.starts_with("Sorry"));
    }

    fn text_prompt_with(phrases: HashMap<String, PromptPhrases>) -> Prompt {
        Prompt::with_phrases(
            Arc::new(|activity: &Activity| activity.text.clone().map(Value::String)),
            phrases,
        )
    }

    #[test]
    fn confirm_recognizer_parses_variants() {
        let prompt = confirm_prompt();
        let yes = Activity::message("  YES ");
        let no = Activity::message("nope");
        let unclear = Activity::message("maybe");
        assert_eq!((prompt.recognizer.as_ref())(&yes), Some(Value::Bool(true)));
        assert_eq!((prompt.recognizer.as_ref())(&no), Some(Value::Bool(false)));
        assert_eq!((prompt.recognizer.as_ref())(&unclear), None);
    }

    #[test]
    fn text_recognizer_rejects_blank_input() {
        let prompt = text_prompt();
        assert_eq!((prompt.recognizer.as_ref())(&Activity::message("   ")), None);
        assert_eq!(
            (prompt.recognizer.as_ref())(&Activity::message(" hi ")),
            Some(Value::String("hi".to_string()))
        );
    }
}
