//! Adapter error types.

use thiserror::Error;

/// Errors raised by channel adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The channel rejected or failed to deliver an operation.
    #[error("channel delivery failed: {message}")]
    Delivery { message: String },

    /// The adapter does not implement the requested operation.
    #[error("operation '{operation}' is not supported by this adapter")]
    NotSupported { operation: &'static str },

    /// No adapter is registered for the channel.
    #[error("no adapter registered for channel '{channel_id}'")]
    NoAdapter { channel_id: String },
}

impl AdapterError {
    /// Create a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a not-supported error.
    pub fn not_supported(operation: &'static str) -> Self {
        Self::NotSupported { operation }
    }

    /// Create a missing-adapter error.
    pub fn no_adapter(channel_id: impl Into<String>) -> Self {
        Self::NoAdapter {
            channel_id: channel_id.into(),
        }
    }
}

/// Convenience type alias for adapter results.
pub type AdapterResult<T> = Result<T, AdapterError>;
