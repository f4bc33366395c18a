//! Middleware pipeline.
//!
//! Middleware wraps turn processing for cross-cutting concerns (state
//! save-points, logging, telemetry). Each middleware receives the turn
//! context and a [`NextTurn`] continuation; calling `next.run()` hands
//! control to the rest of the chain and ultimately the bot's own turn
//! handler. Not calling it short-circuits the turn.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::telemetry::TelemetryClient;

use super::context::TurnContext;
use super::error::TurnCtxResult;

/// The bot's own per-turn logic, run after all middleware.
pub type TurnHandler =
    Box<dyn for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, TurnCtxResult<()>> + Send + Sync>;

/// A single middleware layer.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process a turn. Call `next.run(context)` to continue the chain.
    async fn on_turn(&self, context: &mut TurnContext, next: NextTurn<'_>) -> TurnCtxResult<()>;
}

/// Continuation handed to each middleware: the remaining chain plus the
/// terminal turn handler.
pub struct NextTurn<'a> {
    chain: &'a [Arc<dyn Middleware>],
    handler: &'a TurnHandler,
}

impl<'a> NextTurn<'a> {
    /// Run the rest of the pipeline.
    pub async fn run(self, context: &mut TurnContext) -> TurnCtxResult<()> {
        match self.chain.split_first() {
            Some((head, rest)) => {
                head.on_turn(
                    context,
                    NextTurn {
                        chain: rest,
                        handler: self.handler,
                    },
                )
                .await
            }
            None => (self.handler)(context).await,
        }
    }
}

/// An ordered set of middleware, run in registration order.
#[derive(Default)]
pub struct MiddlewareSet {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the chain.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Run the chain, then `handler`, against a turn context.
    pub async fn run(&self, context: &mut TurnContext, handler: &TurnHandler) -> TurnCtxResult<()> {
        NextTurn {
            chain: &self.middleware,
            handler,
        }
        .run(context)
        .await
    }
}

/// Middleware that records every inbound activity as a telemetry event and
/// a tracing line.
pub struct TelemetryLoggerMiddleware {
    client: Arc<dyn TelemetryClient>,
}

impl TelemetryLoggerMiddleware {
    pub fn new(client: Arc<dyn TelemetryClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Middleware for TelemetryLoggerMiddleware {
    async fn on_turn(&self, context: &mut TurnContext, next: NextTurn<'_>) -> TurnCtxResult<()> {
        let activity = context.activity();
        let mut properties = HashMap::new();
        properties.insert(
            "activity_type".to_string(),
            format!("{:?}", activity.activity_type),
        );
        if let Some(channel_id) = &activity.channel_id {
            properties.insert("channel_id".to_string(), channel_id.clone());
        }
        debug!(activity_type = ?activity.activity_type, "processing inbound activity");
        self.client.track_event("activity_received", properties);
        next.run(context).await
    }
}
