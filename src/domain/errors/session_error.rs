//! Pairing session error types.

use thiserror::Error;

/// Failure to notify the pairing session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SessionError {
    #[error("terminal is not paired with a POS")]
    NotPaired,

    #[error("pairing session unavailable: {message}")]
    Unavailable { message: String },

    #[error("pairing session did not answer in time")]
    Timeout,
}

impl SessionError {
    /// Creates unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
