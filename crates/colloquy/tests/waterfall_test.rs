//! Waterfall sequencing: monotonic step progression, programmatic skips,
//! non-message turns, end-of-sequence semantics and telemetry events.

mod common;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use colloquy::dialog::{
    DialogContext, DialogResult, DialogSet, DialogState, DialogTurnResult, Next, Waterfall,
};
use colloquy::testing::{MemoryTelemetryClient, TestAdapter};

use common::{message_turn, typing_turn};

// ============================================================================
// Steps
// ============================================================================

fn announce_one<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("step one").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn announce_two<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("step two").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn announce_three<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("step three").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn announce_moved_on<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("moved on").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

fn skip_with_value<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("skipping ahead").await?;
        Ok(next.advance(Some(json!(42))))
    })
}

fn end_with_input<'a>(
    dc: &'a mut DialogContext<'_>,
    input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move { dc.end(input).await })
}

fn wait_for_user<'a>(
    dc: &'a mut DialogContext<'_>,
    _input: Option<Value>,
    _next: &'a Next,
) -> BoxFuture<'a, DialogResult<DialogTurnResult>> {
    Box::pin(async move {
        dc.send_activity("your turn").await?;
        Ok(DialogTurnResult::end_of_turn())
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn steps_run_monotonically_in_order() {
    let mut dialogs = DialogSet::new();
    dialogs
        .add(
            "survey",
            Waterfall::default()
                .step(announce_one)
                .step(announce_two)
                .step(announce_three),
        )
        .unwrap();

    let adapter = TestAdapter::new();
    let mut state = DialogState::default();

    let mut context = message_turn(&adapter, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.begin("survey", None).await.unwrap();
    assert!(result.has_active);
    assert_eq!(state.dialog_stack[0].state["step"], json!(0));

    let mut context = message_turn(&adapter, "next");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.continue_dialog().await.unwrap();
    assert!(result.has_active);
    assert_eq!(state.dialog_stack[0].state["step"], json!(1));

    let mut context = message_turn(&adapter, "next");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.continue_dialog().await.unwrap();
    assert!(result.has_active);
    assert_eq!(state.dialog_stack[0].state["step"], json!(2));

    // The step after the last one ends the dialog.
    let mut context = message_turn(&adapter, "done");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.continue_dialog().await.unwrap();
    assert!(!result.has_active);
    assert!(result.has_result);
    assert!(state.dialog_stack.is_empty());

    assert_eq!(
        adapter.sent_text(),
        vec!["step one", "step two", "step three"]
    );
}

#[tokio::test]
async fn next_advances_without_waiting_for_a_turn() {
    let mut dialogs = DialogSet::new();
    dialogs
        .add(
            "shortcut",
            Waterfall::default()
                .step(skip_with_value)
                .step(end_with_input),
        )
        .unwrap();

    let adapter = TestAdapter::new();
    let mut context = message_turn(&adapter, "begin");
    let mut state = DialogState::default();
    let mut dc = dialogs.create_context(&mut context, &mut state);

    // One begin call runs both steps: step two receives the skipped value.
    let result = dc.begin("shortcut", None).await.unwrap();

    assert!(!result.has_active);
    assert!(result.has_result);
    assert_eq!(result.result, Some(json!(42)));
    assert_eq!(adapter.sent_text(), vec!["skipping ahead"]);
}

#[tokio::test]
async fn non_message_activities_do_not_advance_the_sequence() {
    let mut dialogs = DialogSet::new();
    dialogs
        .add(
            "patient",
            Waterfall::default()
                .step(wait_for_user)
                .step(announce_moved_on),
        )
        .unwrap();

    let adapter = TestAdapter::new();
    let mut state = DialogState::default();

    let mut context = message_turn(&adapter, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.begin("patient", None).await.unwrap();
    assert_eq!(state.dialog_stack[0].state["step"], json!(0));

    // A typing indicator arrives; the dialog must stay where it is.
    let mut context = typing_turn(&adapter);
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.continue_dialog().await.unwrap();
    assert!(result.has_active);
    assert_eq!(state.dialog_stack[0].state["step"], json!(0));

    // A real message advances.
    let mut context = message_turn(&adapter, "here");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.continue_dialog().await.unwrap();
    assert_eq!(adapter.sent_text(), vec!["your turn", "moved on"]);
}

#[tokio::test]
async fn running_past_the_last_step_returns_the_users_input() {
    let mut dialogs = DialogSet::new();
    dialogs
        .add("one-question", Waterfall::default().step(wait_for_user))
        .unwrap();

    let adapter = TestAdapter::new();
    let mut state = DialogState::default();

    let mut context = message_turn(&adapter, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.begin("one-question", None).await.unwrap();

    let mut context = message_turn(&adapter, "my answer");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    let result = dc.continue_dialog().await.unwrap();

    assert!(!result.has_active);
    assert!(result.has_result);
    assert_eq!(result.result, Some(json!("my answer")));
}

#[tokio::test]
async fn waterfall_reports_lifecycle_telemetry() {
    let telemetry = Arc::new(MemoryTelemetryClient::new());

    let mut dialogs = DialogSet::new();
    dialogs
        .add(
            "tracked",
            Waterfall::default()
                .step(wait_for_user)
                .step(end_with_input),
        )
        .unwrap();
    dialogs.set_telemetry_client(Some(telemetry.clone()));

    let adapter = TestAdapter::new();
    let mut state = DialogState::default();

    let mut context = message_turn(&adapter, "begin");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.begin("tracked", None).await.unwrap();

    let mut context = message_turn(&adapter, "answer");
    let mut dc = dialogs.create_context(&mut context, &mut state);
    dc.continue_dialog().await.unwrap();

    assert_eq!(
        telemetry.event_names(),
        vec![
            "waterfall_start",
            "waterfall_step",
            "waterfall_step",
            "waterfall_complete",
        ]
    );
}
