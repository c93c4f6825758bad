//! Payment flow steps.

use std::fmt;

use super::PaymentIntentHandle;

/// Current stage of a single payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowStep {
    /// Waiting for the operator to start the charge.
    #[default]
    Ready,
    /// Reader is creating the payment intent.
    Creating,
    /// Reader is waiting for the card.
    Collecting {
        /// Intent being collected for.
        intent: PaymentIntentHandle,
    },
    /// Reader is authorising the charge.
    Processing {
        /// Intent with a captured payment method.
        intent: PaymentIntentHandle,
    },
    /// Charge succeeded.
    Complete {
        /// Finalised intent.
        intent: PaymentIntentHandle,
    },
    /// Attempt was cancelled by the operator or the reader.
    Cancelled,
    /// Attempt failed.
    Error {
        /// Human-readable failure.
        message: String,
    },
}

impl FlowStep {
    /// Returns payload-free kind.
    #[must_use]
    pub const fn kind(&self) -> FlowStepKind {
        match self {
            Self::Ready => FlowStepKind::Ready,
            Self::Creating => FlowStepKind::Creating,
            Self::Collecting { .. } => FlowStepKind::Collecting,
            Self::Processing { .. } => FlowStepKind::Processing,
            Self::Complete { .. } => FlowStepKind::Complete,
            Self::Cancelled => FlowStepKind::Cancelled,
            Self::Error { .. } => FlowStepKind::Error,
        }
    }

    /// Intent held by the step, if any.
    #[must_use]
    pub const fn intent(&self) -> Option<&PaymentIntentHandle> {
        match self {
            Self::Collecting { intent } | Self::Processing { intent } | Self::Complete { intent } => {
                Some(intent)
            }
            Self::Ready | Self::Creating | Self::Cancelled | Self::Error { .. } => None,
        }
    }

    /// Failure message when in `Error`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Step discriminant used by views and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum FlowStepKind {
    Ready,
    Creating,
    Collecting,
    Processing,
    Complete,
    Cancelled,
    Error,
}

impl FlowStepKind {
    /// Returns lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Creating => "creating",
            Self::Collecting => "collecting",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }

    /// Whether a reader call is in flight while in this step.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Creating | Self::Collecting | Self::Processing)
    }
}

impl fmt::Display for FlowStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason the flow navigated away from the payment screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowExit {
    /// Operator dismissed a completed payment.
    Completed,
    /// Operator left without charging.
    Dismissed,
    /// Pairing session dropped the request.
    RequestCleared,
}

impl fmt::Display for FlowExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Dismissed => write!(f, "dismissed"),
            Self::RequestCleared => write!(f, "request cleared"),
        }
    }
}
