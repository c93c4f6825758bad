//! Payment flow use case.
//!
//! Drives one card payment from operator confirmation to an outcome:
//! `ready → creating → collecting → processing → complete`, with
//! `cancelled` and `error` as the other exits. Reader calls run strictly one
//! after another; only collection can be interrupted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info, warn};

use crate::application::dto::{FlowView, OperatorCommand};
use crate::application::services::PaymentHistory;
use crate::domain::entities::{
    FlowExit, FlowStep, FlowStepKind, PaymentIntentHandle, PaymentIntentId, PaymentRequest,
    PaymentResult,
};
use crate::domain::errors::{FlowError, PaymentError, ReaderError, SessionError};
use crate::domain::ports::{CardReaderPort, PairingSessionPort};

const RECENT_RESULTS: usize = 5;

/// Controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentFlowConfig {
    /// Upper bound on each pairing session notification.
    pub notify_timeout: Duration,
}

impl PaymentFlowConfig {
    const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 3_000;

    /// Creates config with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            notify_timeout: Duration::from_millis(Self::DEFAULT_NOTIFY_TIMEOUT_MS),
        }
    }

    /// Sets notification timeout.
    #[must_use]
    pub const fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

impl Default for PaymentFlowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests cancellation of a pending card read from outside the controller.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    requested: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    /// Asks the controller to cancel the current collection.
    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.inner.requested.store(false, Ordering::SeqCst);
    }

    async fn requested(&self) {
        // A permit left over from an earlier attempt wakes us without the flag set.
        while !self.is_requested() {
            self.inner.notify.notified().await;
        }
    }
}

struct Attempt {
    request: PaymentRequest,
    intent_id: Option<PaymentIntentId>,
}

/// `result` is `None` when the reader rejected the cancel and the read was dropped.
struct Collection {
    result: Option<Result<PaymentIntentHandle, ReaderError>>,
    cancel_issued: bool,
    request_withdrawn: bool,
}

/// Payment flow controller for the terminal screen.
pub struct PaymentFlowController {
    reader: Arc<dyn CardReaderPort>,
    session: Arc<dyn PairingSessionPort>,
    config: PaymentFlowConfig,
    step: FlowStep,
    attempt: Option<Attempt>,
    exit: Option<FlowExit>,
    history: PaymentHistory,
    cancel: CancelHandle,
    views: watch::Sender<FlowView>,
}

impl PaymentFlowController {
    /// Creates controller in `ready`.
    #[must_use]
    pub fn new(
        reader: Arc<dyn CardReaderPort>,
        session: Arc<dyn PairingSessionPort>,
        config: PaymentFlowConfig,
    ) -> Self {
        let (views, _) = watch::channel(FlowView::initial());
        let controller = Self {
            reader,
            session,
            config,
            step: FlowStep::Ready,
            attempt: None,
            exit: None,
            history: PaymentHistory::new(),
            cancel: CancelHandle::default(),
            views,
        };
        controller.publish();
        controller
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> &FlowStep {
        &self.step
    }

    /// Why the flow exited, if it did.
    #[must_use]
    pub const fn exit(&self) -> Option<FlowExit> {
        self.exit
    }

    /// Whether the flow navigated away.
    #[must_use]
    pub const fn is_exited(&self) -> bool {
        self.exit.is_some()
    }

    /// Result history.
    #[must_use]
    pub const fn history(&self) -> &PaymentHistory {
        &self.history
    }

    /// Handle for cancelling collection while `confirm` is pending.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Subscribes to view snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FlowView> {
        self.views.subscribe()
    }

    /// Builds a view snapshot.
    #[must_use]
    pub fn view(&self) -> FlowView {
        let request = self
            .attempt
            .as_ref()
            .map(|a| a.request.clone())
            .or_else(|| self.session.current_request());
        let intent_id = self
            .step
            .intent()
            .map(|intent| intent.id().clone())
            .or_else(|| self.attempt.as_ref().and_then(|a| a.intent_id.clone()));

        FlowView {
            step: self.step.kind(),
            message: self.step.error_message().map(str::to_string),
            money: request.as_ref().map(|r| r.money().clone()),
            description: request
                .as_ref()
                .and_then(|r| r.description().map(str::to_string)),
            item_count: request.as_ref().map_or(0, PaymentRequest::item_count),
            intent_id,
            exit: self.exit,
            recent_results: self.history.recent(RECENT_RESULTS).to_vec(),
        }
    }

    /// Charges the session's pending request.
    ///
    /// Returns once the attempt reached `complete`, `cancelled` or `error`,
    /// or the flow exited.
    ///
    /// # Errors
    /// Returns error if the flow is not `ready` or the POS sent no request.
    pub async fn confirm(&mut self) -> Result<(), FlowError> {
        self.ensure_step("confirm", |step| matches!(step, FlowStep::Ready))?;

        let Some(request) = self.session.current_request() else {
            info!("No payment request to confirm");
            self.exit_with(FlowExit::RequestCleared);
            return Err(FlowError::NoActiveRequest);
        };

        info!(
            request_id = %request.id(),
            amount = %request.money(),
            "Starting payment attempt"
        );

        self.cancel.reset();
        let mut requests = self.session.subscribe();

        let money = request.money().clone();
        self.attempt = Some(Attempt {
            request,
            intent_id: None,
        });
        self.transition(FlowStep::Creating);

        let created = self.reader.create_payment_intent(money).await;
        if self.request_withdrawn() {
            self.abandon();
            return Ok(());
        }
        let intent = match created {
            Ok(intent) => intent,
            Err(error) => {
                self.fail(&PaymentError::from_create(&error), &error);
                return Ok(());
            }
        };

        debug!(intent_id = %intent.id(), "Payment intent created");
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.intent_id = Some(intent.id().clone());
        }
        self.transition(FlowStep::Collecting {
            intent: intent.clone(),
        });

        let collection = self.collect(&intent, &mut requests).await;
        let withdrawn = collection.request_withdrawn || self.request_withdrawn();

        let collected = match collection.result {
            Some(Ok(collected)) if !collection.cancel_issued && !withdrawn => collected,
            None => {
                self.finish_cancelled(withdrawn).await;
                return Ok(());
            }
            Some(Ok(_)) => {
                warn!(intent_id = %intent.id(), "Card read after cancellation, not processing");
                self.finish_cancelled(withdrawn).await;
                return Ok(());
            }
            Some(Err(error)) => {
                let failure = PaymentError::from_collect(&error);
                if failure.routes_to_cancelled() {
                    if !collection.cancel_issued {
                        self.cancel_collection().await;
                    }
                    self.finish_cancelled(withdrawn).await;
                } else if withdrawn {
                    self.abandon();
                } else {
                    self.fail(&failure, &error);
                }
                return Ok(());
            }
        };

        self.transition(FlowStep::Processing {
            intent: collected.clone(),
        });

        let processed = self.reader.process_payment(&collected).await;
        match processed {
            Ok(finalized) => {
                let withdrawn = self.request_withdrawn();
                self.complete(finalized).await;
                if withdrawn {
                    warn!("Request withdrawn while processing, payment was captured");
                    self.exit_with(FlowExit::RequestCleared);
                }
            }
            Err(_) if self.request_withdrawn() => self.abandon(),
            Err(error) => self.fail(&PaymentError::from_process(&error), &error),
        }

        Ok(())
    }

    /// Returns to `ready` after a failure or cancellation.
    ///
    /// # Errors
    /// Returns error unless the flow is in `error` or `cancelled`.
    pub fn retry(&mut self) -> Result<(), FlowError> {
        self.ensure_step("retry", |step| {
            matches!(step, FlowStep::Error { .. } | FlowStep::Cancelled)
        })?;

        info!(from = %self.step.kind(), "Operator retrying payment");
        self.attempt = None;
        self.transition(FlowStep::Ready);

        if self.session.current_request().is_none() {
            self.exit_with(FlowExit::RequestCleared);
        }
        Ok(())
    }

    /// Operator abort outside a pending reader call.
    ///
    /// # Errors
    /// Returns error from `creating`, `collecting`, `processing` or `complete`.
    pub async fn cancel(&mut self) -> Result<(), FlowError> {
        self.ensure_step("cancel", |step| {
            matches!(
                step,
                FlowStep::Ready | FlowStep::Error { .. } | FlowStep::Cancelled
            )
        })?;

        match self.step.kind() {
            FlowStepKind::Ready => {
                info!("Operator declined the payment request");
                self.notify_cancel().await;
            }
            FlowStepKind::Error => {
                info!("Operator abandoned failed payment");
                self.enter_cancelled().await;
            }
            _ => {}
        }

        self.exit_with(FlowExit::Dismissed);
        Ok(())
    }

    /// Leaves a finished attempt.
    ///
    /// # Errors
    /// Returns error unless the flow is in `complete` or `cancelled`.
    pub fn dismiss(&mut self) -> Result<(), FlowError> {
        self.ensure_step("dismiss", |step| {
            matches!(step, FlowStep::Complete { .. } | FlowStep::Cancelled)
        })?;

        let exit = if matches!(self.step, FlowStep::Complete { .. }) {
            FlowExit::Completed
        } else {
            FlowExit::Dismissed
        };
        self.exit_with(exit);
        Ok(())
    }

    /// Reacts to the session's request changing outside an attempt.
    ///
    /// Returns whether the flow exited.
    pub fn sync_request(&mut self) -> bool {
        if self.exit.is_some() {
            return false;
        }
        let idle = matches!(self.step, FlowStep::Ready | FlowStep::Error { .. });
        if idle && self.session.current_request().is_none() {
            self.exit_with(FlowExit::RequestCleared);
            return true;
        }
        if idle {
            self.publish();
        }
        false
    }

    /// Starts a new attempt after an exit, if the POS sent a request.
    pub fn begin(&mut self) -> bool {
        if self.exit.is_none() || self.session.current_request().is_none() {
            return false;
        }
        info!("Payment request received, opening payment screen");
        self.exit = None;
        self.attempt = None;
        self.cancel.reset();
        self.transition(FlowStep::Ready);
        true
    }

    /// Runs the controller as a task until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<OperatorCommand>) {
        let mut requests = self.session.subscribe();
        self.sync_request();

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed, stopping payment flow");
                        break;
                    };
                    self.execute(command).await;
                }
                changed = requests.changed() => {
                    if changed.is_err() {
                        debug!("Pairing session closed, stopping payment flow");
                        break;
                    }
                    if self.is_exited() {
                        self.begin();
                    } else {
                        self.sync_request();
                    }
                }
            }
        }
    }

    async fn execute(&mut self, command: OperatorCommand) {
        debug!(%command, step = %self.step.kind(), "Operator command");
        let result = match command {
            OperatorCommand::Start => {
                self.begin();
                Ok(())
            }
            OperatorCommand::Confirm => self.confirm().await,
            OperatorCommand::Retry => self.retry(),
            OperatorCommand::Cancel => self.cancel().await,
            OperatorCommand::Dismiss => self.dismiss(),
        };
        if let Err(error) = result {
            warn!(%command, error = %error, "Operator command rejected");
        }
    }

    async fn collect(
        &self,
        intent: &PaymentIntentHandle,
        requests: &mut watch::Receiver<Option<PaymentRequest>>,
    ) -> Collection {
        let attempt_id = self.attempt.as_ref().map(|a| a.request.id().to_string());
        let collect = self.reader.collect_payment_method(intent);
        tokio::pin!(collect);

        let mut cancel_issued = false;
        let mut request_withdrawn = false;

        loop {
            tokio::select! {
                result = &mut collect => {
                    return Collection {
                        result: Some(result),
                        cancel_issued,
                        request_withdrawn,
                    };
                }
                () = self.cancel.requested(), if !cancel_issued => {
                    info!(intent_id = %intent.id(), "Operator cancelled card collection");
                    cancel_issued = true;
                    if !self.cancel_collection().await {
                        return Collection {
                            result: None,
                            cancel_issued,
                            request_withdrawn,
                        };
                    }
                }
                changed = requests.changed(), if !cancel_issued => {
                    let still_current = changed.is_ok()
                        && requests.borrow_and_update().as_ref().map(PaymentRequest::id)
                            == attempt_id.as_deref();
                    if !still_current {
                        info!(intent_id = %intent.id(), "Payment request withdrawn during collection");
                        request_withdrawn = true;
                        cancel_issued = true;
                        if !self.cancel_collection().await {
                            return Collection {
                                result: None,
                                cancel_issued,
                                request_withdrawn,
                            };
                        }
                    }
                }
            }
        }
    }

    /// Returns whether the reader accepted the cancel.
    async fn cancel_collection(&self) -> bool {
        match self.reader.cancel_collect_payment_method().await {
            Ok(()) => {
                debug!("Reader accepted cancel request");
                true
            }
            Err(error) => {
                warn!(error = %error, "Cancelling collection failed, dropping the read");
                false
            }
        }
    }

    async fn complete(&mut self, intent: PaymentIntentHandle) {
        let intent_id = intent.id().clone();
        if let Some(attempt) = &self.attempt {
            info!(
                intent_id = %intent_id,
                request_id = %attempt.request.id(),
                amount = %attempt.request.money(),
                "Payment complete"
            );
            self.history.record(PaymentResult::succeeded(
                intent_id.clone(),
                attempt.request.id().to_string(),
                attempt.request.money().clone(),
            ));
        }
        self.transition(FlowStep::Complete { intent });
        self.notify("complete_payment", self.session.complete_payment(&intent_id))
            .await;
    }

    async fn finish_cancelled(&mut self, withdrawn: bool) {
        if withdrawn {
            self.abandon();
        } else {
            self.enter_cancelled().await;
        }
    }

    async fn enter_cancelled(&mut self) {
        self.record_cancelled();
        self.transition(FlowStep::Cancelled);
        self.notify_cancel().await;
    }

    /// Ends the attempt because the POS no longer wants it. The session
    /// initiated this, so it is not notified back.
    fn abandon(&mut self) {
        info!(step = %self.step.kind(), "Payment request withdrawn, abandoning attempt");
        self.record_cancelled();
        self.transition(FlowStep::Cancelled);
        self.exit_with(FlowExit::RequestCleared);
    }

    fn record_cancelled(&mut self) {
        if let Some(attempt) = &self.attempt {
            self.history.record(PaymentResult::cancelled(
                attempt.intent_id.clone(),
                attempt.request.id().to_string(),
                attempt.request.money().clone(),
            ));
        }
    }

    fn fail(&mut self, failure: &PaymentError, cause: &ReaderError) {
        warn!(
            step = %self.step.kind(),
            code = %cause.code,
            error = %failure,
            "Payment attempt failed"
        );
        self.transition(FlowStep::Error {
            message: failure.message().to_string(),
        });
    }

    async fn notify_cancel(&self) {
        self.notify("cancel_payment", self.session.cancel_payment())
            .await;
    }

    async fn notify<F>(&self, notification: &'static str, call: F)
    where
        F: Future<Output = Result<(), SessionError>>,
    {
        match self.bounded(call).await {
            Ok(()) => debug!(notification, "Pairing session notified"),
            Err(error) => warn!(
                notification,
                error = %error,
                timeout = ?self.config.notify_timeout,
                "Pairing session notification failed"
            ),
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<(), SessionError>
    where
        F: Future<Output = Result<(), SessionError>>,
    {
        tokio::time::timeout(self.config.notify_timeout, call)
            .await
            .unwrap_or(Err(SessionError::Timeout))
    }

    fn request_withdrawn(&self) -> bool {
        let Some(attempt) = &self.attempt else {
            return false;
        };
        self.session
            .current_request()
            .is_none_or(|current| current.id() != attempt.request.id())
    }

    fn ensure_step(
        &self,
        operation: &'static str,
        allowed: impl FnOnce(&FlowStep) -> bool,
    ) -> Result<(), FlowError> {
        if self.exit.is_some() {
            return Err(FlowError::Exited);
        }
        if allowed(&self.step) {
            Ok(())
        } else {
            Err(FlowError::invalid(self.step.kind(), operation))
        }
    }

    fn transition(&mut self, step: FlowStep) {
        debug!(from = %self.step.kind(), to = %step.kind(), "Payment flow transition");
        self.step = step;
        self.publish();
    }

    fn exit_with(&mut self, exit: FlowExit) {
        info!(reason = %exit, step = %self.step.kind(), "Leaving payment screen");
        self.exit = Some(exit);
        self.attempt = None;
        self.publish();
    }

    fn publish(&self) {
        self.views.send_replace(self.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Currency, Money};
    use crate::domain::ports::mocks::{MockCardReader, MockPairingSession};
    use test_case::test_case;

    fn request(amount: u64) -> PaymentRequest {
        PaymentRequest::new("req-1", Money::new(amount, Currency::jpy()).unwrap())
    }

    fn setup(
        reader: MockCardReader,
        session: MockPairingSession,
    ) -> (
        PaymentFlowController,
        Arc<MockCardReader>,
        Arc<MockPairingSession>,
    ) {
        let reader = Arc::new(reader);
        let session = Arc::new(session);
        let controller = controller_for(reader.clone(), session.clone());
        (controller, reader, session)
    }

    fn controller_for(
        reader: Arc<MockCardReader>,
        session: Arc<MockPairingSession>,
    ) -> PaymentFlowController {
        PaymentFlowController::new(
            reader,
            session,
            PaymentFlowConfig::new().with_notify_timeout(Duration::from_millis(50)),
        )
    }

    #[tokio::test]
    async fn test_successful_payment_completes() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new(),
            MockPairingSession::new(Some(request(1500))),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step().kind(), FlowStepKind::Complete);
        assert_eq!(
            session.completed(),
            vec![PaymentIntentId::new(MockCardReader::INTENT_ID)]
        );
        assert_eq!(session.cancelled(), 0);
        assert_eq!(controller.history().len(), 1);
        assert!(controller.history().records()[0].is_success());
        assert_eq!(reader.amounts(), vec![request(1500).money().clone()]);
        assert_eq!(controller.view().money.unwrap().amount(), 1500);
    }

    #[tokio::test]
    async fn test_reader_cancellation_routes_to_cancelled() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new().fail_collect(ReaderError::canceled("")),
            MockPairingSession::new(Some(request(3000))),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(reader.process_calls(), 0);
        assert_eq!(session.cancelled(), 1);
        assert!(session.completed().is_empty());
        assert_eq!(controller.history().successes().count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_code_wins_over_message() {
        let (mut controller, _reader, _session) = setup(
            MockCardReader::new().fail_collect(ReaderError::canceled("Card declined by issuer")),
            MockPairingSession::new(Some(request(3000))),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step(), &FlowStep::Cancelled);
    }

    #[tokio::test]
    async fn test_create_failure_then_retry_keeps_request() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new().fail_create(ReaderError::unexpected("Reader offline")),
            MockPairingSession::new(Some(request(800))),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step().error_message(), Some("Reader offline"));
        assert_eq!(controller.view().message.as_deref(), Some("Reader offline"));
        assert_eq!(reader.collect_calls(), 0);

        controller.retry().unwrap();

        assert_eq!(controller.step(), &FlowStep::Ready);
        assert!(!controller.is_exited());
        assert_eq!(session.current_request(), Some(request(800)));
        assert_eq!(controller.view().money.unwrap().amount(), 800);
    }

    #[tokio::test]
    async fn test_cleared_request_in_ready_exits_without_reader_calls() {
        let (mut controller, reader, session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(500))));

        session.clear();
        assert!(controller.sync_request());

        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(reader.total_calls(), 0);
        assert!(matches!(controller.confirm().await, Err(FlowError::Exited)));
        assert_eq!(reader.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_without_request_exits() {
        let (mut controller, reader, _session) =
            setup(MockCardReader::new(), MockPairingSession::new(None));

        let result = controller.confirm().await;

        assert!(matches!(result, Err(FlowError::NoActiveRequest)));
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(reader.total_calls(), 0);
    }

    #[derive(Debug, Clone, Copy)]
    enum Phase {
        Create,
        Collect,
        Process,
    }

    #[test_case(Phase::Create, "" ; "create blank")]
    #[test_case(Phase::Create, "No reader" ; "create with message")]
    #[test_case(Phase::Collect, "" ; "collect blank")]
    #[test_case(Phase::Collect, "Chip read error" ; "collect with message")]
    #[test_case(Phase::Process, "" ; "process blank")]
    #[test_case(Phase::Process, "Insufficient funds" ; "process with message")]
    #[tokio::test]
    async fn test_non_cancellation_failures_route_to_error(phase: Phase, message: &str) {
        let error = ReaderError::declined(message);
        let reader = match phase {
            Phase::Create => MockCardReader::new().fail_create(error),
            Phase::Collect => MockCardReader::new().fail_collect(error),
            Phase::Process => MockCardReader::new().fail_process(error),
        };
        let (mut controller, reader, session) =
            setup(reader, MockPairingSession::new(Some(request(1200))));

        controller.confirm().await.unwrap();

        let shown = controller.step().error_message().unwrap();
        assert!(!shown.is_empty());
        if !message.is_empty() {
            assert_eq!(shown, message);
        }
        assert_eq!(reader.cancel_calls(), 0);
        assert!(session.completed().is_empty());
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_operator_cancel_during_collection() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new().collect_until_cancelled(),
            MockPairingSession::new(Some(request(3000))),
        );
        let handle = controller.cancel_handle();
        let waiting = reader.clone();

        let (result, ()) = tokio::join!(controller.confirm(), async move {
            waiting.collect_started().await;
            handle.request();
        });

        result.unwrap();
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(reader.process_calls(), 0);
        assert_eq!(session.cancelled(), 1);
        assert_eq!(controller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cancel_call_is_not_surfaced() {
        let (mut controller, reader, _session) = setup(
            MockCardReader::new()
                .collect_until_cancelled()
                .fail_cancel(ReaderError::unexpected("reader busy")),
            MockPairingSession::new(Some(request(3000))),
        );
        let handle = controller.cancel_handle();
        let waiting = reader.clone();

        let (result, ()) = tokio::join!(controller.confirm(), async move {
            waiting.collect_started().await;
            handle.request();
        });

        result.unwrap();
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.cancel_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_cancel_drops_stuck_collection() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new()
                .collect_never_returns()
                .fail_cancel(ReaderError::unexpected("reader busy")),
            MockPairingSession::new(Some(request(3000))),
        );
        let handle = controller.cancel_handle();
        let waiting = reader.clone();

        let (result, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(2), controller.confirm()),
            async move {
                waiting.collect_started().await;
                handle.request();
            }
        );

        result.expect("confirm kept waiting on the reader").unwrap();
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert!(!controller.is_exited());
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(reader.process_calls(), 0);
        assert_eq!(session.cancelled(), 1);
        assert_eq!(controller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_cancel_after_withdrawal_exits() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new()
                .collect_never_returns()
                .fail_cancel(ReaderError::unexpected("reader busy")),
            MockPairingSession::new(Some(request(3000))),
        );
        let waiting = reader.clone();
        let clearing = session.clone();

        let (result, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(2), controller.confirm()),
            async move {
                waiting.collect_started().await;
                clearing.clear();
            }
        );

        result.expect("confirm kept waiting on the reader").unwrap();
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(session.cancelled(), 0);
    }

    #[tokio::test]
    async fn test_card_read_after_cancel_is_not_processed() {
        let (mut controller, reader, _session) = setup(
            MockCardReader::new().collect_ignores_cancel(),
            MockPairingSession::new(Some(request(3000))),
        );
        let handle = controller.cancel_handle();
        let waiting = reader.clone();

        let (result, ()) = tokio::join!(controller.confirm(), async move {
            waiting.collect_started().await;
            handle.request();
        });

        result.unwrap();
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.process_calls(), 0);
    }

    #[tokio::test]
    async fn test_request_cleared_during_collection_exits() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new().collect_until_cancelled(),
            MockPairingSession::new(Some(request(3000))),
        );
        let waiting = reader.clone();
        let clearing = session.clone();

        let (result, ()) = tokio::join!(controller.confirm(), async move {
            waiting.collect_started().await;
            clearing.clear();
        });

        result.unwrap();
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(reader.process_calls(), 0);
        assert_eq!(session.cancelled(), 0);
    }

    #[tokio::test]
    async fn test_request_replaced_during_collection_exits() {
        let (mut controller, reader, session) = setup(
            MockCardReader::new().collect_until_cancelled(),
            MockPairingSession::new(Some(request(3000))),
        );
        let waiting = reader.clone();
        let replacing = session.clone();
        let replacement = PaymentRequest::new("req-2", Money::new(4000, Currency::jpy()).unwrap());

        let (result, ()) = tokio::join!(controller.confirm(), async move {
            waiting.collect_started().await;
            replacing.push(replacement);
        });

        result.unwrap();
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(reader.cancel_calls(), 1);
        assert_eq!(reader.process_calls(), 0);
        assert_eq!(session.cancelled(), 0);

        assert!(controller.begin());
        assert_eq!(controller.step(), &FlowStep::Ready);
        assert_eq!(controller.view().money.unwrap().amount(), 4000);
    }

    #[tokio::test]
    async fn test_request_cleared_during_create_exits() {
        let session = Arc::new(MockPairingSession::new(Some(request(3000))));
        let clearing = session.clone();
        let reader = Arc::new(MockCardReader::new().before_create(move || clearing.clear()));
        let mut controller = controller_for(reader.clone(), session.clone());

        controller.confirm().await.unwrap();

        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.total_calls(), 1);
        assert_eq!(session.cancelled(), 0);
        let record = controller.history().last().unwrap();
        assert!(!record.is_success());
        assert_eq!(record.intent_id, None);
    }

    #[tokio::test]
    async fn test_request_cleared_during_failed_processing_exits() {
        let session = Arc::new(MockPairingSession::new(Some(request(3000))));
        let clearing = session.clone();
        let reader = Arc::new(
            MockCardReader::new()
                .fail_process(ReaderError::declined("Do not honor"))
                .before_process(move || clearing.clear()),
        );
        let mut controller = controller_for(reader.clone(), session.clone());

        controller.confirm().await.unwrap();

        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(reader.process_calls(), 1);
        assert_eq!(reader.cancel_calls(), 0);
        assert_eq!(session.cancelled(), 0);
        assert!(session.completed().is_empty());
        let record = controller.history().last().unwrap();
        assert!(!record.is_success());
        assert_eq!(
            record.intent_id,
            Some(PaymentIntentId::new(MockCardReader::INTENT_ID))
        );
    }

    #[tokio::test]
    async fn test_request_cleared_during_successful_processing_still_completes() {
        let session = Arc::new(MockPairingSession::new(Some(request(3000))));
        let clearing = session.clone();
        let reader = Arc::new(MockCardReader::new().before_process(move || clearing.clear()));
        let mut controller = controller_for(reader.clone(), session.clone());

        controller.confirm().await.unwrap();

        assert_eq!(controller.step().kind(), FlowStepKind::Complete);
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
        assert_eq!(
            session.completed(),
            vec![PaymentIntentId::new(MockCardReader::INTENT_ID)]
        );
        assert_eq!(session.cancelled(), 0);
        assert!(controller.history().last().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_retry_from_cancelled_without_request_exits() {
        let (mut controller, _reader, session) = setup(
            MockCardReader::new().fail_collect(ReaderError::canceled("")),
            MockPairingSession::new(Some(request(3000))),
        );

        controller.confirm().await.unwrap();
        session.clear();
        controller.retry().unwrap();

        assert_eq!(controller.step(), &FlowStep::Ready);
        assert_eq!(controller.exit(), Some(FlowExit::RequestCleared));
    }

    #[tokio::test]
    async fn test_cancel_from_error_records_and_exits() {
        let (mut controller, _reader, session) = setup(
            MockCardReader::new().fail_process(ReaderError::declined("Do not honor")),
            MockPairingSession::new(Some(request(2000))),
        );

        controller.confirm().await.unwrap();
        controller.cancel().await.unwrap();

        assert_eq!(controller.step(), &FlowStep::Cancelled);
        assert_eq!(controller.exit(), Some(FlowExit::Dismissed));
        assert_eq!(session.cancelled(), 1);
        let record = controller.history().last().unwrap();
        assert!(!record.is_success());
        assert_eq!(
            record.intent_id,
            Some(PaymentIntentId::new(MockCardReader::INTENT_ID))
        );
    }

    #[tokio::test]
    async fn test_cancel_from_ready_notifies_session() {
        let (mut controller, reader, session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(900))));

        controller.cancel().await.unwrap();

        assert_eq!(controller.exit(), Some(FlowExit::Dismissed));
        assert_eq!(session.cancelled(), 1);
        assert_eq!(reader.total_calls(), 0);
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_change_step() {
        let (mut controller, _reader, _session) = setup(
            MockCardReader::new(),
            MockPairingSession::new(Some(request(1500))).failing(),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step().kind(), FlowStepKind::Complete);
        assert!(!controller.is_exited());
    }

    #[tokio::test]
    async fn test_hanging_notification_times_out() {
        let (mut controller, _reader, _session) = setup(
            MockCardReader::new().fail_collect(ReaderError::canceled("")),
            MockPairingSession::new(Some(request(1500))).hanging(),
        );

        controller.confirm().await.unwrap();

        assert_eq!(controller.step(), &FlowStep::Cancelled);
    }

    #[tokio::test]
    async fn test_unanswered_notification_becomes_timeout() {
        let (controller, _reader, _session) =
            setup(MockCardReader::new(), MockPairingSession::new(None));

        let result = controller
            .bounded(std::future::pending::<Result<(), SessionError>>())
            .await;

        assert_eq!(result, Err(SessionError::Timeout));
    }

    #[tokio::test]
    async fn test_invalid_transitions_are_rejected() {
        let (mut controller, _reader, _session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(1500))));

        assert!(matches!(
            controller.retry(),
            Err(FlowError::InvalidTransition {
                step: FlowStepKind::Ready,
                ..
            })
        ));
        assert!(controller.dismiss().is_err());

        controller.confirm().await.unwrap();

        assert!(controller.confirm().await.is_err());
        assert!(controller.retry().is_err());
        assert!(controller.cancel().await.is_err());
        assert_eq!(controller.step().kind(), FlowStepKind::Complete);
    }

    #[tokio::test]
    async fn test_dismiss_complete_then_begin_next_attempt() {
        let (mut controller, _reader, _session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(1500))));

        controller.confirm().await.unwrap();
        controller.dismiss().unwrap();
        assert_eq!(controller.exit(), Some(FlowExit::Completed));

        assert!(controller.begin());
        assert_eq!(controller.step(), &FlowStep::Ready);
        assert!(!controller.is_exited());
        assert_eq!(controller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_views_are_published() {
        let (mut controller, _reader, _session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(1500))));
        let views = controller.subscribe();

        controller.confirm().await.unwrap();

        let view = views.borrow().clone();
        assert_eq!(view.step, FlowStepKind::Complete);
        assert_eq!(view.headline(), "Payment complete");
        assert_eq!(
            view.intent_id,
            Some(PaymentIntentId::new(MockCardReader::INTENT_ID))
        );
        assert_eq!(view.recent_results.len(), 1);
    }

    #[tokio::test]
    async fn test_run_processes_commands() {
        let (controller, _reader, session) =
            setup(MockCardReader::new(), MockPairingSession::new(Some(request(1500))));
        let mut views = controller.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(controller.run(rx));

        tx.send(OperatorCommand::Confirm).unwrap();
        tokio::time::timeout(
            Duration::from_secs(1),
            views.wait_for(|view| view.step == FlowStepKind::Complete),
        )
        .await
        .unwrap()
        .unwrap();

        tx.send(OperatorCommand::Dismiss).unwrap();
        tokio::time::timeout(
            Duration::from_secs(1),
            views.wait_for(|view| view.exit == Some(FlowExit::Completed)),
        )
        .await
        .unwrap()
        .unwrap();

        drop(tx);
        task.await.unwrap();
        assert_eq!(session.completed().len(), 1);
    }
}
