//! In-process pairing session.
//!
//! Stands in for the link to the desktop POS: requests are pushed locally
//! and outcomes are kept in a log instead of being sent anywhere.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::entities::{PaymentIntentId, PaymentRequest};
use crate::domain::errors::SessionError;
use crate::domain::ports::PairingSessionPort;

/// Outcome reported back to the POS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The request was charged.
    Completed {
        /// Request that was charged.
        request_id: String,
        /// Finalised intent.
        intent_id: PaymentIntentId,
        /// When it was reported.
        at: DateTime<Utc>,
    },
    /// The request was abandoned.
    Cancelled {
        /// Request that was abandoned.
        request_id: Option<String>,
        /// When it was reported.
        at: DateTime<Utc>,
    },
}

/// Pairing session held in memory.
pub struct InMemoryPairingSession {
    terminal_name: String,
    request: watch::Sender<Option<PaymentRequest>>,
    outcomes: Mutex<Vec<SessionOutcome>>,
    paired: AtomicBool,
}

impl InMemoryPairingSession {
    /// Creates a paired session with no pending request.
    #[must_use]
    pub fn new(terminal_name: impl Into<String>) -> Self {
        let (request, _) = watch::channel(None);
        Self {
            terminal_name: terminal_name.into(),
            request,
            outcomes: Mutex::new(Vec::new()),
            paired: AtomicBool::new(true),
        }
    }

    /// Terminal name shown to the POS.
    #[must_use]
    pub fn terminal_name(&self) -> &str {
        &self.terminal_name
    }

    /// Replaces the pending request, as when the POS pushes a new charge.
    pub fn push_request(&self, request: PaymentRequest) {
        info!(
            request_id = %request.id(),
            amount = %request.money(),
            "Payment request received"
        );
        self.request.send_replace(Some(request));
    }

    /// Drops the pending request, as when the POS clears the session.
    pub fn clear(&self) {
        if self.request.send_replace(None).is_some() {
            info!("Payment request cleared");
        }
    }

    /// Marks the terminal as unpaired; notifications then fail.
    pub fn unpair(&self) {
        self.paired.store(false, Ordering::SeqCst);
        self.clear();
    }

    /// Outcomes reported so far.
    #[must_use]
    pub fn outcomes(&self) -> Vec<SessionOutcome> {
        self.outcomes.lock().clone()
    }

    fn ensure_paired(&self) -> Result<(), SessionError> {
        if self.paired.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SessionError::NotPaired)
        }
    }

    fn take_request(&self) -> Option<PaymentRequest> {
        self.request.send_replace(None)
    }
}

#[async_trait]
impl PairingSessionPort for InMemoryPairingSession {
    fn current_request(&self) -> Option<PaymentRequest> {
        self.request.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<PaymentRequest>> {
        self.request.subscribe()
    }

    async fn complete_payment(&self, intent_id: &PaymentIntentId) -> Result<(), SessionError> {
        self.ensure_paired()?;
        let request = self
            .take_request()
            .ok_or_else(|| SessionError::unavailable("no request to complete"))?;

        debug!(request_id = %request.id(), intent_id = %intent_id, "Reporting completed payment");
        self.outcomes.lock().push(SessionOutcome::Completed {
            request_id: request.id().to_string(),
            intent_id: intent_id.clone(),
            at: Utc::now(),
        });
        Ok(())
    }

    async fn cancel_payment(&self) -> Result<(), SessionError> {
        self.ensure_paired()?;
        let request_id = self.take_request().map(|r| r.id().to_string());

        debug!(request_id = ?request_id, "Reporting cancelled payment");
        self.outcomes.lock().push(SessionOutcome::Cancelled {
            request_id,
            at: Utc::now(),
        });
        Ok(())
    }
}
