//! State store error types.

use thiserror::Error;

/// Errors raised by the state layer.
#[derive(Debug, Error)]
pub enum StateError {
    /// An optimistic-concurrency write lost the race.
    #[error("etag conflict writing '{key}': the stored document changed since it was read")]
    EtagConflict { key: String },

    /// Error encoding or decoding a stored value.
    #[error("state serialization error: {message}")]
    Serialization { message: String },

    /// The inbound activity has no channel id to key state by.
    #[error("cannot compute a storage key: activity has no channel id")]
    MissingChannelId,

    /// The inbound activity has no conversation to key state by.
    #[error("cannot compute a storage key: activity has no conversation")]
    MissingConversation,
}

impl StateError {
    /// Create an etag conflict error.
    pub fn etag_conflict(key: impl Into<String>) -> Self {
        Self::EtagConflict { key: key.into() }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl std::fmt::Display) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }
}

/// Convenience type alias for state results.
pub type StateResult<T> = Result<T, StateError>;
