//! In-memory payment result history.

use tracing::debug;

use crate::domain::entities::PaymentResult;

/// Append-only list of attempt outcomes for this process.
#[derive(Debug, Default, Clone)]
pub struct PaymentHistory {
    records: Vec<PaymentResult>,
}

impl PaymentHistory {
    /// Creates empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a result.
    pub fn record(&mut self, result: PaymentResult) {
        debug!(
            outcome = ?result.outcome,
            request_id = %result.request_id,
            total = self.records.len() + 1,
            "Recorded payment result"
        );
        self.records.push(result);
    }

    /// All results in recording order.
    #[must_use]
    pub fn records(&self) -> &[PaymentResult] {
        &self.records
    }

    /// Successful results only.
    pub fn successes(&self) -> impl Iterator<Item = &PaymentResult> {
        self.records.iter().filter(|r| r.is_success())
    }

    /// Most recent result.
    #[must_use]
    pub fn last(&self) -> Option<&PaymentResult> {
        self.records.last()
    }

    /// Up to `count` most recent results, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[PaymentResult] {
        let start = self.records.len().saturating_sub(count);
        &self.records[start..]
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
