//! Dialog engine error types.

use thiserror::Error;

use crate::turn::TurnError;

/// Errors raised by the dialog stack engine.
///
/// Lookup failures are configuration or drift errors: they indicate a
/// programming mistake or a deployment that removed a dialog while
/// conversations referencing it were still in flight. They are never
/// swallowed; a silently dropped stack would surface as an unresponsive bot.
#[derive(Debug, Error)]
pub enum DialogError {
    /// A dialog id was looked up but never registered.
    #[error("{operation}: a dialog with an id of '{id}' wasn't found")]
    DialogNotFound { operation: &'static str, id: String },

    /// A dialog id was registered twice.
    #[error("a dialog with an id of '{id}' has already been added")]
    DuplicateDialog { id: String },

    /// An operation that requires an active dialog found the stack empty.
    #[error("{operation}: no active dialog on the stack")]
    NoActiveDialog { operation: &'static str },

    /// A component dialog was begun before any dialog was added to it.
    #[error("component dialog has no initial dialog; add a dialog before beginning it")]
    MissingInitialDialog,

    /// Persisted dialog state failed to decode.
    #[error("failed to decode dialog state: {message}")]
    StateDecode { message: String },

    /// Dialog state failed to encode for persistence.
    #[error("failed to encode dialog state: {message}")]
    StateEncode { message: String },

    /// A turn context operation failed inside a dialog.
    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl DialogError {
    /// Create a lookup-failure error.
    pub fn dialog_not_found(operation: &'static str, id: impl Into<String>) -> Self {
        Self::DialogNotFound {
            operation,
            id: id.into(),
        }
    }

    /// Create a duplicate-registration error.
    pub fn duplicate_dialog(id: impl Into<String>) -> Self {
        Self::DuplicateDialog { id: id.into() }
    }

    /// Create a missing-active-dialog error.
    pub fn no_active_dialog(operation: &'static str) -> Self {
        Self::NoActiveDialog { operation }
    }

    /// Create a state decode error.
    pub fn state_decode(message: impl std::fmt::Display) -> Self {
        Self::StateDecode {
            message: message.to_string(),
        }
    }

    /// Create a state encode error.
    pub fn state_encode(message: impl std::fmt::Display) -> Self {
        Self::StateEncode {
            message: message.to_string(),
        }
    }
}

/// Convenience type alias for dialog results.
pub type DialogResult<T> = Result<T, DialogError>;
