//! Payment flow DTOs.

use std::fmt;

use crate::domain::entities::{
    FlowExit, FlowStepKind, Money, PaymentIntentId, PaymentResult,
};

/// Operator action sent to a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Start a new attempt after the flow exited.
    Start,
    /// Charge the pending request.
    Confirm,
    /// Go back to `ready` after a failure or cancellation.
    Retry,
    /// Abort the attempt.
    Cancel,
    /// Leave a finished attempt.
    Dismiss,
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Confirm => "confirm",
            Self::Retry => "retry",
            Self::Cancel => "cancel",
            Self::Dismiss => "dismiss",
        };
        f.write_str(name)
    }
}

/// Everything a view needs to render the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowView {
    /// Current step.
    pub step: FlowStepKind,
    /// Failure message while in `error`.
    pub message: Option<String>,
    /// Amount being charged, or pending from the POS.
    pub money: Option<Money>,
    /// Request description.
    pub description: Option<String>,
    /// Units on the POS receipt, zero when it sent no line items.
    pub item_count: u32,
    /// Intent of the current attempt.
    pub intent_id: Option<PaymentIntentId>,
    /// Set once the flow navigated away.
    pub exit: Option<FlowExit>,
    /// Latest results, newest last.
    pub recent_results: Vec<PaymentResult>,
}

impl FlowView {
    /// Creates view for a fresh flow.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            step: FlowStepKind::Ready,
            message: None,
            money: None,
            description: None,
            item_count: 0,
            intent_id: None,
            exit: None,
            recent_results: Vec::new(),
        }
    }

    /// Whether the payment screen should be shown.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.exit.is_none()
    }

    /// Title for the current step.
    #[must_use]
    pub const fn headline(&self) -> &'static str {
        match self.step {
            FlowStepKind::Ready => "Ready to charge",
            FlowStepKind::Creating => "Preparing payment",
            FlowStepKind::Collecting => "Present card",
            FlowStepKind::Processing => "Processing",
            FlowStepKind::Complete => "Payment complete",
            FlowStepKind::Cancelled => "Payment cancelled",
            FlowStepKind::Error => "Payment failed",
        }
    }
}

impl Default for FlowView {
    fn default() -> Self {
        Self::initial()
    }
}
