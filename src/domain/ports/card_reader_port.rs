//! Card reader port definition.

use async_trait::async_trait;

use crate::domain::entities::{Money, PaymentIntentHandle};
use crate::domain::errors::ReaderError;

/// Port for the card reader SDK.
///
/// Calls are issued one at a time. `cancel_collect_payment_method` is the
/// only call that may arrive while another (`collect_payment_method`) is
/// still pending; the pending call is expected to return `Canceled` once the
/// reader acknowledges.
#[async_trait]
pub trait CardReaderPort: Send + Sync {
    /// Creates a payment intent scoped to the amount.
    async fn create_payment_intent(&self, money: Money)
    -> Result<PaymentIntentHandle, ReaderError>;

    /// Waits for the customer to present a card.
    async fn collect_payment_method(
        &self,
        intent: &PaymentIntentHandle,
    ) -> Result<PaymentIntentHandle, ReaderError>;

    /// Authorises the charge.
    async fn process_payment(
        &self,
        intent: &PaymentIntentHandle,
    ) -> Result<PaymentIntentHandle, ReaderError>;

    /// Asks the reader to abandon a pending collection.
    async fn cancel_collect_payment_method(&self) -> Result<(), ReaderError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::entities::{PaymentIntentId, PaymentIntentStatus};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type Hook = Box<dyn Fn() + Send + Sync>;

    /// Scriptable reader for controller tests.
    #[derive(Default)]
    pub struct MockCardReader {
        create_error: Mutex<Option<ReaderError>>,
        collect_error: Mutex<Option<ReaderError>>,
        process_error: Mutex<Option<ReaderError>>,
        cancel_error: Mutex<Option<ReaderError>>,
        wait_for_cancel: AtomicBool,
        succeed_after_cancel: AtomicBool,
        hang_collect: AtomicBool,
        before_create: Mutex<Option<Hook>>,
        before_process: Mutex<Option<Hook>>,
        cancel_notify: Notify,
        collect_started: Notify,
        amounts: Mutex<Vec<Money>>,
        create_calls: AtomicUsize,
        collect_calls: AtomicUsize,
        process_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
    }

    impl MockCardReader {
        /// Intent id returned by every successful create.
        pub const INTENT_ID: &'static str = "pi_mock_1";

        /// Creates a reader on which every call succeeds.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes create fail.
        pub fn fail_create(self, error: ReaderError) -> Self {
            *self.create_error.lock() = Some(error);
            self
        }

        /// Makes collect fail.
        pub fn fail_collect(self, error: ReaderError) -> Self {
            *self.collect_error.lock() = Some(error);
            self
        }

        /// Makes process fail.
        pub fn fail_process(self, error: ReaderError) -> Self {
            *self.process_error.lock() = Some(error);
            self
        }

        /// Makes the cancel call fail.
        pub fn fail_cancel(self, error: ReaderError) -> Self {
            *self.cancel_error.lock() = Some(error);
            self
        }

        /// Keeps collect pending until a cancel call arrives, then returns `Canceled`.
        pub fn collect_until_cancelled(self) -> Self {
            self.wait_for_cancel.store(true, Ordering::SeqCst);
            self
        }

        /// Keeps collect pending until a cancel call arrives, then succeeds anyway.
        pub fn collect_ignores_cancel(self) -> Self {
            self.wait_for_cancel.store(true, Ordering::SeqCst);
            self.succeed_after_cancel.store(true, Ordering::SeqCst);
            self
        }

        /// Keeps collect pending forever, whatever the cancel call does.
        pub fn collect_never_returns(self) -> Self {
            self.hang_collect.store(true, Ordering::SeqCst);
            self
        }

        /// Runs `hook` at the start of create, before it resolves.
        pub fn before_create(self, hook: impl Fn() + Send + Sync + 'static) -> Self {
            *self.before_create.lock() = Some(Box::new(hook));
            self
        }

        /// Runs `hook` at the start of process, before it resolves.
        pub fn before_process(self, hook: impl Fn() + Send + Sync + 'static) -> Self {
            *self.before_process.lock() = Some(Box::new(hook));
            self
        }

        /// Resolves once collect has been entered.
        pub async fn collect_started(&self) {
            self.collect_started.notified().await;
        }

        /// Amounts passed to create, in call order.
        pub fn amounts(&self) -> Vec<Money> {
            self.amounts.lock().clone()
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn collect_calls(&self) -> usize {
            self.collect_calls.load(Ordering::SeqCst)
        }

        pub fn process_calls(&self) -> usize {
            self.process_calls.load(Ordering::SeqCst)
        }

        pub fn cancel_calls(&self) -> usize {
            self.cancel_calls.load(Ordering::SeqCst)
        }

        /// Total reader calls of any kind.
        pub fn total_calls(&self) -> usize {
            self.create_calls() + self.collect_calls() + self.process_calls() + self.cancel_calls()
        }
    }

    #[async_trait]
    impl CardReaderPort for MockCardReader {
        async fn create_payment_intent(
            &self,
            money: Money,
        ) -> Result<PaymentIntentHandle, ReaderError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.amounts.lock().push(money.clone());
            if let Some(hook) = self.before_create.lock().as_ref() {
                hook();
            }
            if let Some(error) = self.create_error.lock().clone() {
                return Err(error);
            }
            Ok(PaymentIntentHandle::new(
                PaymentIntentId::new(Self::INTENT_ID),
                PaymentIntentStatus::RequiresPaymentMethod,
                money,
            ))
        }

        async fn collect_payment_method(
            &self,
            intent: &PaymentIntentHandle,
        ) -> Result<PaymentIntentHandle, ReaderError> {
            self.collect_calls.fetch_add(1, Ordering::SeqCst);
            self.collect_started.notify_one();

            if self.hang_collect.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }

            if self.wait_for_cancel.load(Ordering::SeqCst) {
                self.cancel_notify.notified().await;
                if !self.succeed_after_cancel.load(Ordering::SeqCst) {
                    return Err(ReaderError::canceled("Collection cancelled"));
                }
            }

            if let Some(error) = self.collect_error.lock().clone() {
                return Err(error);
            }
            Ok(intent.with_status(PaymentIntentStatus::RequiresConfirmation))
        }

        async fn process_payment(
            &self,
            intent: &PaymentIntentHandle,
        ) -> Result<PaymentIntentHandle, ReaderError> {
            self.process_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hook) = self.before_process.lock().as_ref() {
                hook();
            }
            if let Some(error) = self.process_error.lock().clone() {
                return Err(error);
            }
            Ok(intent.with_status(PaymentIntentStatus::Succeeded))
        }

        async fn cancel_collect_payment_method(&self) -> Result<(), ReaderError> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            self.cancel_notify.notify_one();
            match self.cancel_error.lock().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }
}
