//! Payment request pushed from the paired POS.

use serde::{Deserialize, Serialize};

use super::Money;

/// One line on the receipt the POS attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name.
    pub name: String,
    /// Quantity sold.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price in the request currency's minor unit.
    pub unit_amount: u64,
}

const fn default_quantity() -> u32 {
    1
}

/// Pending charge received from the POS.
///
/// Requests are immutable: the terminal only ever reads them, and the
/// pairing session replaces or clears them as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    id: String,
    #[serde(flatten)]
    money: Money,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
}

impl PaymentRequest {
    /// Creates a request without description or line items.
    #[must_use]
    pub fn new(id: impl Into<String>, money: Money) -> Self {
        Self {
            id: id.into(),
            money,
            description: None,
            line_items: Vec::new(),
        }
    }

    /// Sets description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// POS-assigned request identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Amount to charge.
    #[must_use]
    pub const fn money(&self) -> &Money {
        &self.money
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Line items.
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }
}
