//! Reader-issued payment intent handle.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Money;

/// Opaque identifier assigned by the card reader SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentIntentId(String);

impl PaymentIntentId {
    /// Wraps an SDK identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns identifier as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status reported by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    Processing,
    Succeeded,
    Canceled,
}

/// In-progress card charge, owned by the flow for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentHandle {
    id: PaymentIntentId,
    status: PaymentIntentStatus,
    money: Money,
}

impl PaymentIntentHandle {
    /// Creates handle.
    #[must_use]
    pub const fn new(id: PaymentIntentId, status: PaymentIntentStatus, money: Money) -> Self {
        Self { id, status, money }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> &PaymentIntentId {
        &self.id
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> PaymentIntentStatus {
        self.status
    }

    /// Amount the intent is scoped to.
    #[must_use]
    pub const fn money(&self) -> &Money {
        &self.money
    }

    /// Returns a copy of the handle with a new status.
    #[must_use]
    pub fn with_status(&self, status: PaymentIntentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
