//! Persistence correctness: the dialog stack round-trips through the
//! storage layer between turns, reconstructed contexts behave identically,
//! and concurrent writers are caught by the etag check.

mod common;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use colloquy::dialog::{
    DialogContext, DialogResult, DialogSet, DialogState, DialogTurnResult, Next, Waterfall,
};
use colloquy::state::{ConversationState, MemoryStorage, StateError, StateProperty};
use colloquy::testing::TestAdapter;

use common::message_turn;

// ============================================================================
// Steps
// ============================================================================

fn ask_color<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("Favorite color?").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn remember_color<'a>(
    dc: &'a mut DialogContext<'_>,
    input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        if let (Some(instance), Some(color)) = (dc.active_dialog_mut(), input.clone()) {
            instance.state.insert("color".to_string(), color);
        }
        dc.send_activity("Favorite animal?").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn finish_survey<'a>(
    dc: &'a mut DialogContext<'_>,
    input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        let color = dc
            .active_dialog()
            .and_then(|instance| instance.state.get("color").cloned())
            .unwrap_or(Value::Null);
        let animal = input.unwrap_or(Value::Null);
        dc.end(Some(json!({ "color": color, "animal": animal }))).await
    })
}

fn survey() -> Waterfall {
    Waterfall::default()
        .step(ask_color)
        .step(remember_color)
        .step(finish_survey)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn conversation_resumes_from_storage_across_turns() {
    let storage = Arc::new(MemoryStorage::new());
    let stack_property = StateProperty::<DialogState>::new("dialog_state");

    let mut dialogs = DialogSet::new();
    dialogs.add("survey", survey()).unwrap();

    let adapter = TestAdapter::new();

    // Each closure-free block below is one fully independent turn: load
    // from storage, act, save. Nothing survives in memory in between.
    {
        let conversation = ConversationState::new(storage.clone());
        let mut context = message_turn(&adapter, "begin");
        let mut document = conversation.load(&context).await.unwrap();
        let mut state = stack_property.get_or_default(&document).unwrap();

        let mut dc = dialogs.create_context(&mut context, &mut state);
        dc.begin("survey", None).await.unwrap();

        stack_property.set(&mut document, &state).unwrap();
        conversation.save(&context, &document).await.unwrap();
    }
    {
        let conversation = ConversationState::new(storage.clone());
        let mut context = message_turn(&adapter, "teal");
        let mut document = conversation.load(&context).await.unwrap();
        let mut state = stack_property.get_or_default(&document).unwrap();
        assert_eq!(state.dialog_stack.len(), 1);

        let mut dc = dialogs.create_context(&mut context, &mut state);
        let result = dc.continue_dialog().await.unwrap();
        assert!(result.has_active);

        stack_property.set(&mut document, &state).unwrap();
        conversation.save(&context, &document).await.unwrap();
    }
    let final_result = {
        let conversation = ConversationState::new(storage.clone());
        let mut context = message_turn(&adapter, "heron");
        let mut document = conversation.load(&context).await.unwrap();
        let mut state = stack_property.get_or_default(&document).unwrap();

        let mut dc = dialogs.create_context(&mut context, &mut state);
        let result = dc.continue_dialog().await.unwrap();

        stack_property.set(&mut document, &state).unwrap();
        conversation.save(&context, &document).await.unwrap();
        result
    };

    assert!(final_result.has_result);
    assert_eq!(
        final_result.result,
        Some(json!({ "color": "teal", "animal": "heron" }))
    );
    assert_eq!(adapter.sent_text(), vec!["Favorite color?", "Favorite animal?"]);
}

#[tokio::test]
async fn persisted_shape_is_plain_json() {
    let mut dialogs = DialogSet::new();
    dialogs.add("survey", survey()).unwrap();

    let adapter = TestAdapter::new();
    let mut state = DialogState::default();
    let mut context = message_turn(&adapter, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.begin("survey", None).await.unwrap();

    let encoded = serde_json::to_value(&state).unwrap();
    assert_eq!(
        encoded,
        json!({
            "dialog_stack": [
                { "id": "survey", "state": { "step": 0 } }
            ]
        })
    );
}

#[tokio::test]
async fn reconstructed_context_behaves_identically() {
    let mut dialogs = DialogSet::new();
    dialogs.add("survey", survey()).unwrap();

    let adapter_a = TestAdapter::new();
    let mut state = DialogState::default();
    let mut context = message_turn(&adapter_a, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.begin("survey", None).await.unwrap();

    let persisted = serde_json::to_string(&state).unwrap();

    // Drive two copies of the same persisted stack through the same turn;
    // both must do exactly the same thing.
    let mut copy_a: DialogState = serde_json::from_str(&persisted).unwrap();
    let mut copy_b: DialogState = serde_json::from_str(&persisted).unwrap();

    let adapter_b = TestAdapter::new();
    let adapter_c = TestAdapter::new();

    let mut context = message_turn(&adapter_b, "teal");
    let mut dc = dialogs.create_context(&mut context, &mut copy_a);
    let result_a = dc.continue_dialog().await.unwrap();

    let mut context = message_turn(&adapter_c, "teal");
    let mut dc = dialogs.create_context(&mut context, &mut copy_b);
    let result_b = dc.continue_dialog().await.unwrap();

    assert_eq!(result_a, result_b);
    assert_eq!(adapter_b.sent_text(), adapter_c.sent_text());
    assert_eq!(
        serde_json::to_value(&copy_a).unwrap(),
        serde_json::to_value(&copy_b).unwrap()
    );
}

#[tokio::test]
async fn stale_turn_save_is_rejected_by_the_etag_check() {
    let storage = Arc::new(MemoryStorage::new());
    let conversation = ConversationState::new(storage.clone());
    let counter = StateProperty::<u32>::new("counter");

    let adapter = TestAdapter::new();
    let context = message_turn(&adapter, "hi");

    let mut document = conversation.load(&context).await.unwrap();
    counter.set(&mut document, &0).unwrap();
    conversation.save(&context, &document).await.unwrap();

    // Two turn processors race on the same conversation.
    let mut first = conversation.load(&context).await.unwrap();
    let mut second = conversation.load(&context).await.unwrap();

    counter.set(&mut first, &1).unwrap();
    conversation.save(&context, &first).await.unwrap();

    counter.set(&mut second, &99).unwrap();
    let err = conversation.save(&context, &second).await.unwrap_err();
    assert!(matches!(err, StateError::EtagConflict { .. }));

    let latest = conversation.load(&context).await.unwrap();
    assert_eq!(counter.get(&latest).unwrap(), Some(1));
}
