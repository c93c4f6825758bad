//! Card reader error types.

use std::fmt;

use thiserror::Error;

/// Error codes reported by the card reader SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderErrorCode {
    /// Operator- or timeout-driven cancellation.
    Canceled,
    /// No reader connected.
    NotConnected,
    /// Reader is handling another command.
    ReaderBusy,
    /// Card or issuer declined.
    Declined,
    /// Hardware-level timeout other than a cancellation.
    Timeout,
    /// Anything else.
    Unexpected,
}

impl fmt::Display for ReaderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Canceled => "Canceled",
            Self::NotConnected => "NotConnected",
            Self::ReaderBusy => "ReaderBusy",
            Self::Declined => "Declined",
            Self::Timeout => "Timeout",
            Self::Unexpected => "Unexpected",
        };
        f.write_str(name)
    }
}

/// Failure returned by a card reader call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ReaderError {
    /// Error code.
    pub code: ReaderErrorCode,
    /// SDK message, possibly empty.
    pub message: String,
}

impl ReaderError {
    /// Creates error with code and message.
    #[must_use]
    pub fn new(code: ReaderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates cancellation error.
    #[must_use]
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ReaderErrorCode::Canceled, message)
    }

    /// Creates declined error.
    #[must_use]
    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(ReaderErrorCode::Declined, message)
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ReaderErrorCode::Unexpected, message)
    }

    /// Returns whether the reader reported a cancellation.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self.code, ReaderErrorCode::Canceled)
    }
}
