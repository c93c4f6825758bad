//! Errors returned to the operator-facing caller.

use thiserror::Error;

use crate::domain::entities::FlowStepKind;

/// Rejected controller operation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FlowError {
    #[error("cannot {operation} while {step}")]
    InvalidTransition {
        step: FlowStepKind,
        operation: &'static str,
    },

    #[error("no payment request from the POS")]
    NoActiveRequest,

    #[error("payment flow has exited")]
    Exited,
}

impl FlowError {
    /// Creates invalid transition error.
    #[must_use]
    pub const fn invalid(step: FlowStepKind, operation: &'static str) -> Self {
        Self::InvalidTransition { step, operation }
    }
}
