//! Pairing session port definition.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::entities::{PaymentIntentId, PaymentRequest};
use crate::domain::errors::SessionError;

/// Port for the link between this terminal and its POS.
#[async_trait]
pub trait PairingSessionPort: Send + Sync {
    /// Returns the pending request, if the POS pushed one.
    fn current_request(&self) -> Option<PaymentRequest>;

    /// Subscribes to request changes. `None` means the session was cleared.
    fn subscribe(&self) -> watch::Receiver<Option<PaymentRequest>>;

    /// Reports a successful charge.
    async fn complete_payment(&self, intent_id: &PaymentIntentId) -> Result<(), SessionError>;

    /// Reports that the charge was abandoned.
    async fn cancel_payment(&self) -> Result<(), SessionError>;
}
