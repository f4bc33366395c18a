//! Turn-based execution model.
//!
//! # Architecture
//!
//! ```text
//!  inbound Activity
//!        │
//!        ▼
//!  ┌─────────────┐     ┌──────────────────────────────┐
//!  │ process_turn│────▶│ MiddlewareSet                │
//!  │ (builds and │     │  m1 → m2 → … → TurnHandler   │
//!  │  expires    │     │  (continuation passing)      │
//!  │  TurnContext)│    └──────────────────────────────┘
//!  └─────────────┘                 │
//!                                  ▼
//!                       bot logic: ActivityRouter or
//!                       a DialogContext over a DialogSet
//! ```
//!
//! Exactly one turn per conversation is processed to completion at a time;
//! the [`TurnContext`] is expired when the turn ends so nothing can act on
//! it afterwards.

mod context;
mod error;
mod middleware;
mod router;

use std::sync::Arc;

use tracing::debug;

use colloquy_channel_protocol::Activity;

use crate::adapter::ChannelAdapter;

pub use context::TurnContext;
pub use error::{TurnCtxResult, TurnError};
pub use middleware::{
    Middleware, MiddlewareSet, NextTurn, TelemetryLoggerMiddleware, TurnHandler,
};
pub use router::{ActivityRouter, EventHandler, NextEvent, TurnEvent};

/// Process one inbound activity to completion.
///
/// Builds a [`TurnContext`], runs the middleware chain and the terminal
/// handler, then expires the context before handing it back so leaked
/// references cannot act after the turn ends. The (expired) context is
/// returned for inspection, e.g. of [`TurnContext::responded`].
pub async fn process_turn(
    adapter: Arc<dyn ChannelAdapter>,
    middleware: &MiddlewareSet,
    activity: Activity,
    handler: TurnHandler,
) -> TurnCtxResult<TurnContext> {
    debug!(activity_type = ?activity.activity_type, "starting turn");
    let mut context = TurnContext::new(adapter, activity);
    let result = middleware.run(&mut context, &handler).await;
    context.expire();
    result.map(|_| context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inbound_message, TestAdapter};

    #[tokio::test]
    async fn process_turn_expires_the_context() {
        let adapter = TestAdapter::new();
        let middleware = MiddlewareSet::new();
        let handler: TurnHandler = Box::new(|context| {
            Box::pin(async move {
                context.send_activity("during the turn").await?;
                Ok(())
            })
        });

        let mut context = process_turn(adapter.clone(), &middleware, inbound_message("hi"), handler)
            .await
            .unwrap();

        assert!(context.responded());
        assert_eq!(adapter.sent_text(), vec!["during the turn"]);
        // The turn is over: the returned context can no longer send.
        assert!(matches!(
            context.send_activity("too late").await,
            Err(TurnError::TurnExpired)
        ));
    }
}
