//! Turn processing error types.

use thiserror::Error;

use crate::adapter::AdapterError;

/// Errors raised while processing a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// A context operation was attempted after the turn ended.
    #[error("turn context expired: the turn this context belongs to has ended")]
    TurnExpired,

    /// The channel adapter failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// The adapter returned fewer receipts than activities sent.
    #[error("adapter returned no resource response for a sent activity")]
    MissingResponse,
}

/// Convenience type alias for turn results.
pub type TurnCtxResult<T> = Result<T, TurnError>;
