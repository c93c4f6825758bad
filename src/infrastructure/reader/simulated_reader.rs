//! Simulated card reader for running the terminal without hardware.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::{Money, PaymentIntentHandle, PaymentIntentId, PaymentIntentStatus};
use crate::domain::errors::{ReaderError, ReaderErrorCode};
use crate::domain::ports::CardReaderPort;

/// Scripted result of the next payment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SimulatedOutcome {
    /// Every call succeeds.
    #[default]
    Approve,
    /// Intent creation fails.
    FailCreate,
    /// The card is declined during collection.
    DeclineCollect,
    /// The reader times out waiting for a card and reports a cancellation.
    CancelCollect,
    /// Authorisation fails.
    FailProcess,
}

impl std::fmt::Display for SimulatedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::FailCreate => write!(f, "fail-create"),
            Self::DeclineCollect => write!(f, "decline-collect"),
            Self::CancelCollect => write!(f, "cancel-collect"),
            Self::FailProcess => write!(f, "fail-process"),
        }
    }
}

/// In-process reader with configurable latency and outcome.
pub struct SimulatedCardReader {
    latency: Duration,
    outcome: Mutex<SimulatedOutcome>,
    /// Cancel signal of the collection in progress, if any.
    pending_collect: Mutex<Option<oneshot::Sender<()>>>,
}

impl SimulatedCardReader {
    /// Creates reader.
    #[must_use]
    pub fn new(latency: Duration, outcome: SimulatedOutcome) -> Self {
        Self {
            latency,
            outcome: Mutex::new(outcome),
            pending_collect: Mutex::new(None),
        }
    }

    /// Changes the scripted outcome for subsequent calls.
    pub fn set_outcome(&self, outcome: SimulatedOutcome) {
        info!(%outcome, "Simulated reader outcome changed");
        *self.outcome.lock() = outcome;
    }

    /// Returns the scripted outcome.
    #[must_use]
    pub fn outcome(&self) -> SimulatedOutcome {
        *self.outcome.lock()
    }

    /// Whether a collection is waiting for a card.
    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.pending_collect.lock().is_some()
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for SimulatedCardReader {
    fn default() -> Self {
        Self::new(Duration::from_millis(800), SimulatedOutcome::Approve)
    }
}

#[async_trait]
impl CardReaderPort for SimulatedCardReader {
    async fn create_payment_intent(
        &self,
        money: Money,
    ) -> Result<PaymentIntentHandle, ReaderError> {
        self.delay().await;
        if self.outcome() == SimulatedOutcome::FailCreate {
            return Err(ReaderError::new(
                ReaderErrorCode::NotConnected,
                "Card reader is not connected",
            ));
        }

        let id = PaymentIntentId::new(format!("pi_sim_{}", Uuid::new_v4().simple()));
        debug!(intent_id = %id, amount = %money, "Simulated intent created");
        Ok(PaymentIntentHandle::new(
            id,
            PaymentIntentStatus::RequiresPaymentMethod,
            money,
        ))
    }

    async fn collect_payment_method(
        &self,
        intent: &PaymentIntentHandle,
    ) -> Result<PaymentIntentHandle, ReaderError> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        *self.pending_collect.lock() = Some(cancel_tx);

        let cancelled = tokio::select! {
            signal = cancel_rx => signal.is_ok(),
            () = tokio::time::sleep(self.latency * 3) => false,
        };
        self.pending_collect.lock().take();

        if cancelled {
            debug!(intent_id = %intent.id(), "Simulated collection cancelled");
            return Err(ReaderError::canceled("Collection cancelled"));
        }

        match self.outcome() {
            SimulatedOutcome::DeclineCollect => Err(ReaderError::declined("Card declined")),
            SimulatedOutcome::CancelCollect => {
                Err(ReaderError::canceled("Timed out waiting for a card"))
            }
            _ => Ok(intent.with_status(PaymentIntentStatus::RequiresConfirmation)),
        }
    }

    async fn process_payment(
        &self,
        intent: &PaymentIntentHandle,
    ) -> Result<PaymentIntentHandle, ReaderError> {
        self.delay().await;
        if self.outcome() == SimulatedOutcome::FailProcess {
            return Err(ReaderError::declined("Insufficient funds"));
        }
        Ok(intent.with_status(PaymentIntentStatus::Succeeded))
    }

    async fn cancel_collect_payment_method(&self) -> Result<(), ReaderError> {
        let Some(cancel) = self.pending_collect.lock().take() else {
            return Err(ReaderError::new(
                ReaderErrorCode::ReaderBusy,
                "No collection in progress",
            ));
        };
        // The collection may have finished in the meantime; a dropped receiver is fine.
        let _ = cancel.send(());
        Ok(())
    }
}
