//! Outcome records kept for the operator.

use chrono::{DateTime, Utc};

use super::{Money, PaymentIntentId};

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PaymentOutcome {
    Succeeded,
    Cancelled,
}

/// History entry appended on completion or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    /// Outcome.
    pub outcome: PaymentOutcome,
    /// Intent the outcome belongs to; absent when cancelled before one existed.
    pub intent_id: Option<PaymentIntentId>,
    /// Request that was charged.
    pub request_id: String,
    /// Amount requested.
    pub money: Money,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl PaymentResult {
    /// Creates a success record stamped now.
    #[must_use]
    pub fn succeeded(intent_id: PaymentIntentId, request_id: String, money: Money) -> Self {
        Self {
            outcome: PaymentOutcome::Succeeded,
            intent_id: Some(intent_id),
            request_id,
            money,
            recorded_at: Utc::now(),
        }
    }

    /// Creates a cancellation record stamped now.
    #[must_use]
    pub fn cancelled(intent_id: Option<PaymentIntentId>, request_id: String, money: Money) -> Self {
        Self {
            outcome: PaymentOutcome::Cancelled,
            intent_id,
            request_id,
            money,
            recorded_at: Utc::now(),
        }
    }

    /// Whether the charge went through.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, PaymentOutcome::Succeeded)
    }
}
