//! Payment attempt failures.

use thiserror::Error;

use super::ReaderError;

/// Why a payment attempt stopped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PaymentError {
    #[error("{message}")]
    IntentCreationFailed { message: String },

    #[error("{message}")]
    CollectionFailed { message: String },

    #[error("{message}")]
    OperatorCancelled { message: String },

    #[error("{message}")]
    ProcessingFailed { message: String },
}

impl PaymentError {
    const CREATE_FALLBACK: &'static str = "Could not start the payment";
    const COLLECT_FALLBACK: &'static str = "Could not read the card";
    const CANCEL_FALLBACK: &'static str = "Payment was cancelled";
    const PROCESS_FALLBACK: &'static str = "The payment could not be processed";

    /// Maps a failed intent creation.
    #[must_use]
    pub fn from_create(error: &ReaderError) -> Self {
        Self::IntentCreationFailed {
            message: message_or(error, Self::CREATE_FALLBACK),
        }
    }

    /// Maps a failed collection. A `Canceled` code always becomes
    /// `OperatorCancelled`, whatever the message says.
    #[must_use]
    pub fn from_collect(error: &ReaderError) -> Self {
        if error.is_cancellation() {
            Self::OperatorCancelled {
                message: message_or(error, Self::CANCEL_FALLBACK),
            }
        } else {
            Self::CollectionFailed {
                message: message_or(error, Self::COLLECT_FALLBACK),
            }
        }
    }

    /// Maps a failed processing call.
    #[must_use]
    pub fn from_process(error: &ReaderError) -> Self {
        Self::ProcessingFailed {
            message: message_or(error, Self::PROCESS_FALLBACK),
        }
    }

    /// Whether the failure leads to `cancelled` instead of `error`.
    #[must_use]
    pub const fn routes_to_cancelled(&self) -> bool {
        matches!(self, Self::OperatorCancelled { .. })
    }

    /// Operator-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::IntentCreationFailed { message }
            | Self::CollectionFailed { message }
            | Self::OperatorCancelled { message }
            | Self::ProcessingFailed { message } => message,
        }
    }
}

fn message_or(error: &ReaderError, fallback: &str) -> String {
    let message = error.message.trim();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}
